/*
 * Responsibility
 * - Magic DID token の decode (base64 → [proof, claim])
 * - proof の署名回復 (personal_sign + ecrecover) と iss アドレスの一致確認
 * - 時刻系 claim (ext / nbf) と aud の検証
 */
use base64::{Engine as _, engine::general_purpose::STANDARD};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::Deserialize;
use sha3::{Digest, Keccak256};

use crate::services::identity::provider::{ParseError, ParsedToken, ValidationError};

const DID_ETHR_PREFIX: &str = "did:ethr:";
const PROOF_LEN: usize = 65;
const ADDRESS_LEN: usize = 20;

type Address = [u8; ADDRESS_LEN];

/// Knobs applied when validating a parsed token.
#[derive(Debug, Clone, Default)]
pub struct DidTokenPolicy {
    pub client_id: Option<String>,
    pub nbf_grace_seconds: i64,
}

/// Claim fields the service relies on; `iat`, `sub`, `tid` and `add` are ignored.
#[derive(Debug, Clone, Deserialize)]
struct DidClaim {
    ext: i64,
    nbf: i64,
    iss: String,
    #[serde(default)]
    aud: String,
}

#[derive(Debug, Clone)]
pub struct DidToken {
    proof: String,
    // The exact signed text; re-serializing the parsed claim would change the hash.
    raw_claim: String,
    claim: DidClaim,
    issuer_address: Address,
    policy: DidTokenPolicy,
}

fn parse_address(hex_addr: &str) -> Option<Address> {
    let hex_addr = hex_addr.strip_prefix("0x")?;
    let bytes = hex::decode(hex_addr).ok()?;
    Address::try_from(bytes).ok()
}

/// Ethereum `personal_sign` digest of `message`.
fn personal_sign_digest(message: &str) -> Keccak256 {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut digest = Keccak256::new();
    digest.update(prefix.as_bytes());
    digest.update(message.as_bytes());
    digest
}

fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // uncompressed point: 0x04 || X || Y
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    let mut address = [0u8; ADDRESS_LEN];
    address.copy_from_slice(&hash[hash.len() - ADDRESS_LEN..]);
    address
}

fn recover_signer(message: &str, proof: &[u8]) -> Result<Address, ValidationError> {
    let (rs, v) = proof.split_at(PROOF_LEN - 1);

    let signature = Signature::from_slice(rs).map_err(|_| ValidationError::InvalidProof)?;

    // wallets emit v as 27/28, raw recovery ids are 0/1
    let v = match v[0] {
        27 | 28 => v[0] - 27,
        other => other,
    };
    let recovery_id = RecoveryId::from_byte(v).ok_or(ValidationError::InvalidProof)?;

    // k256 only accepts low-S signatures; flip parity when normalizing
    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low) => (
            low,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    };

    let key =
        VerifyingKey::recover_from_digest(personal_sign_digest(message), &signature, recovery_id)
            .map_err(|_| ValidationError::SignatureMismatch)?;

    Ok(address_of(&key))
}

impl DidToken {
    pub fn parse(raw: &str, policy: DidTokenPolicy) -> Result<Self, ParseError> {
        let decoded = STANDARD.decode(raw.trim())?;

        let parts: Vec<String> = serde_json::from_slice(&decoded)?;
        let [proof, raw_claim] = <[String; 2]>::try_from(parts)
            .map_err(|_| ParseError::Structure("expected [proof, claim]"))?;

        let claim: DidClaim = serde_json::from_str(&raw_claim)?;

        let issuer_address = claim
            .iss
            .strip_prefix(DID_ETHR_PREFIX)
            .and_then(parse_address)
            .ok_or(ParseError::Structure("issuer is not a did:ethr address"))?;

        Ok(Self {
            proof,
            raw_claim,
            claim,
            issuer_address,
            policy,
        })
    }

    pub fn validate_at(&self, now: i64) -> Result<(), ValidationError> {
        let proof = self.proof.strip_prefix("0x").unwrap_or(&self.proof);
        let proof = match hex::decode(proof) {
            Ok(bytes) if bytes.len() == PROOF_LEN => bytes,
            _ => return Err(ValidationError::InvalidProof),
        };

        if recover_signer(&self.raw_claim, &proof)? != self.issuer_address {
            return Err(ValidationError::SignatureMismatch);
        }

        if self.claim.ext < now {
            return Err(ValidationError::Expired {
                ext: self.claim.ext,
            });
        }

        if self.claim.nbf.saturating_sub(self.policy.nbf_grace_seconds) > now {
            return Err(ValidationError::NotYetValid {
                nbf: self.claim.nbf,
            });
        }

        if let Some(client_id) = &self.policy.client_id
            && self.claim.aud != *client_id
        {
            return Err(ValidationError::AudienceMismatch);
        }

        Ok(())
    }
}

impl ParsedToken for DidToken {
    fn validate(&self) -> Result<(), ValidationError> {
        self.validate_at(chrono::Utc::now().timestamp())
    }

    fn issuer(&self) -> &str {
        &self.claim.iss
    }
}

#[cfg(test)]
mod tests {
    use k256::ecdsa::SigningKey;
    use serde_json::json;

    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).unwrap()
    }

    fn issuer_of(key: &SigningKey) -> String {
        format!(
            "{DID_ETHR_PREFIX}0x{}",
            hex::encode(address_of(key.verifying_key()))
        )
    }

    fn sign(key: &SigningKey, message: &str) -> String {
        let (signature, recovery_id) = key
            .sign_digest_recoverable(personal_sign_digest(message))
            .unwrap();
        let mut proof = signature.to_bytes().to_vec();
        proof.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(proof))
    }

    fn encode_token(proof: &str, claim: &str) -> String {
        STANDARD.encode(json!([proof, claim]).to_string())
    }

    fn claim_for(key: &SigningKey, ext: i64, nbf: i64) -> serde_json::Value {
        json!({
            "iat": NOW - 10,
            "ext": ext,
            "iss": issuer_of(key),
            "sub": "6tFXTfRxykwMKOOjSMbdPrEMrpUl3m3j8DQycFqO2tw=",
            "aud": "client-123",
            "nbf": nbf,
            "tid": "2ddf5983-983b-487d-b464-bc5e283a03c5",
        })
    }

    fn signed_token(key: &SigningKey, claim: serde_json::Value) -> String {
        let claim = claim.to_string();
        encode_token(&sign(key, &claim), &claim)
    }

    fn policy(client_id: Option<&str>) -> DidTokenPolicy {
        DidTokenPolicy {
            client_id: client_id.map(str::to_string),
            nbf_grace_seconds: 300,
        }
    }

    fn parse(raw: &str) -> DidToken {
        DidToken::parse(raw, policy(None)).unwrap()
    }

    #[test]
    fn parses_and_validates_a_signed_token() {
        let key = signing_key(7);
        let raw = signed_token(&key, claim_for(&key, NOW + 900, NOW));
        let token = DidToken::parse(&raw, policy(Some("client-123"))).unwrap();

        assert_eq!(token.issuer(), issuer_of(&key));
        assert!(token.validate_at(NOW).is_ok());
    }

    #[test]
    fn issuer_address_is_matched_case_insensitively() {
        let key = signing_key(7);
        let mut claim = claim_for(&key, NOW + 900, NOW);
        let upper = hex::encode_upper(address_of(key.verifying_key()));
        claim["iss"] = json!(format!("{DID_ETHR_PREFIX}0x{upper}"));
        let raw = signed_token(&key, claim);
        assert!(parse(&raw).validate_at(NOW).is_ok());
    }

    #[test]
    fn forged_proof_for_another_issuer_is_rejected() {
        let victim = signing_key(7);
        let attacker = signing_key(9);

        // claim names the victim, proof comes from the attacker
        let claim = claim_for(&victim, NOW + 900, NOW).to_string();
        let raw = encode_token(&sign(&attacker, &claim), &claim);
        assert_eq!(
            parse(&raw).validate_at(NOW),
            Err(ValidationError::SignatureMismatch)
        );
    }

    #[test]
    fn all_zero_proof_is_rejected() {
        let victim = signing_key(7);
        let claim = claim_for(&victim, NOW + 900, NOW).to_string();
        let raw = encode_token(&format!("0x{}", "00".repeat(PROOF_LEN)), &claim);
        assert!(parse(&raw).validate_at(NOW).is_err());
    }

    #[test]
    fn tampered_claim_is_rejected() {
        let key = signing_key(7);
        let claim = claim_for(&key, NOW + 900, NOW).to_string();
        let proof = sign(&key, &claim);

        let tampered = claim_for(&key, NOW + 999_999, NOW).to_string();
        let raw = encode_token(&proof, &tampered);
        assert_eq!(
            parse(&raw).validate_at(NOW),
            Err(ValidationError::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_non_base64() {
        let err = DidToken::parse("%%%not-base64%%%", policy(None)).unwrap_err();
        assert!(matches!(err, ParseError::Encoding(_)));
    }

    #[test]
    fn rejects_wrong_array_shape() {
        let raw = STANDARD.encode(json!(["only-proof"]).to_string());
        let err = DidToken::parse(&raw, policy(None)).unwrap_err();
        assert!(matches!(err, ParseError::Structure(_)));
    }

    #[test]
    fn rejects_claim_that_is_not_json() {
        let raw = encode_token("0x00", "{not json");
        let err = DidToken::parse(&raw, policy(None)).unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn rejects_non_did_issuer() {
        let key = signing_key(7);
        for iss in ["someone@example.com", "did:ethr:", "did:ethr:0xabc"] {
            let mut claim = claim_for(&key, NOW + 900, NOW);
            claim["iss"] = json!(iss);
            let raw = signed_token(&key, claim);
            let err = DidToken::parse(&raw, policy(None)).unwrap_err();
            assert!(matches!(err, ParseError::Structure(_)), "{iss}");
        }
    }

    #[test]
    fn expired_token_fails_validation() {
        let key = signing_key(7);
        let raw = signed_token(&key, claim_for(&key, NOW - 1, NOW - 600));
        assert_eq!(
            parse(&raw).validate_at(NOW),
            Err(ValidationError::Expired { ext: NOW - 1 })
        );
    }

    #[test]
    fn nbf_respects_grace_period() {
        let key = signing_key(7);

        let raw = signed_token(&key, claim_for(&key, NOW + 900, NOW + 200));
        assert!(parse(&raw).validate_at(NOW).is_ok());

        let raw = signed_token(&key, claim_for(&key, NOW + 900, NOW + 301));
        assert_eq!(
            parse(&raw).validate_at(NOW),
            Err(ValidationError::NotYetValid { nbf: NOW + 301 })
        );
    }

    #[test]
    fn extreme_nbf_values_do_not_overflow() {
        let key = signing_key(7);

        let raw = signed_token(&key, claim_for(&key, NOW + 900, i64::MIN));
        assert!(parse(&raw).validate_at(NOW).is_ok());

        let raw = signed_token(&key, claim_for(&key, NOW + 900, i64::MAX));
        assert_eq!(
            parse(&raw).validate_at(NOW),
            Err(ValidationError::NotYetValid { nbf: i64::MAX })
        );
    }

    #[test]
    fn audience_is_enforced_only_when_configured() {
        let key = signing_key(7);
        let raw = signed_token(&key, claim_for(&key, NOW + 900, NOW));

        let token = DidToken::parse(&raw, policy(Some("other-client"))).unwrap();
        assert_eq!(
            token.validate_at(NOW),
            Err(ValidationError::AudienceMismatch)
        );

        assert!(parse(&raw).validate_at(NOW).is_ok());
    }

    #[test]
    fn short_proof_fails_validation() {
        let key = signing_key(7);
        let claim = claim_for(&key, NOW + 900, NOW).to_string();
        let raw = encode_token("0xdeadbeef", &claim);
        assert_eq!(
            parse(&raw).validate_at(NOW),
            Err(ValidationError::InvalidProof)
        );
    }
}
