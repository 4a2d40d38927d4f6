use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::services::identity::{
    did_token::{DidToken, DidTokenPolicy},
    provider::{IdentityProvider, LookupError, ParseError, ParsedToken, UserMetadata},
};

const SECRET_KEY_HEADER: &str = "X-Magic-Secret-Key";
const USER_METADATA_PATH: &str = "v1/admin/auth/user/get";

#[derive(Debug, Deserialize)]
struct MetadataEnvelope {
    #[serde(default)]
    data: Option<MetadataData>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    error_code: String,
}

// Failed lookups come back with `"data": {}`.
#[derive(Debug, Deserialize)]
struct MetadataData {
    #[serde(default)]
    issuer: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    public_address: Option<String>,
}

/// Magic admin API client.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct MagicProvider {
    http: reqwest::Client,
    api_base: Url,
    secret_key: String,
    policy: DidTokenPolicy,
}

impl std::fmt::Debug for MagicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagicProvider")
            .field("api_base", &self.api_base.as_str())
            .field("policy", &self.policy)
            .finish()
    }
}

impl MagicProvider {
    pub fn new(
        http: reqwest::Client,
        api_base: Url,
        secret_key: impl Into<String>,
        policy: DidTokenPolicy,
    ) -> Self {
        Self {
            http,
            api_base,
            secret_key: secret_key.into(),
            policy,
        }
    }

    fn metadata_url(&self, issuer: &str) -> Result<Url, LookupError> {
        let mut url = self.api_base.join(USER_METADATA_PATH)?;
        url.query_pairs_mut().append_pair("issuer", issuer);
        Ok(url)
    }
}

#[async_trait]
impl IdentityProvider for MagicProvider {
    fn provider_name(&self) -> &'static str {
        "magic"
    }

    fn parse_token(&self, raw: &str) -> Result<Box<dyn ParsedToken>, ParseError> {
        let token = DidToken::parse(raw, self.policy.clone())?;
        Ok(Box::new(token))
    }

    async fn metadata_by_issuer(&self, issuer: &str) -> Result<UserMetadata, LookupError> {
        let url = self.metadata_url(issuer)?;

        let resp = self
            .http
            .get(url)
            .header(SECRET_KEY_HEADER, &self.secret_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let envelope: MetadataEnvelope = resp.json().await?;
        if envelope.status != "ok" {
            return Err(LookupError::Rejected(format!(
                "{} {}",
                envelope.error_code, envelope.message
            )));
        }

        let data = envelope
            .data
            .ok_or_else(|| LookupError::Rejected("missing data".to_string()))?;

        Ok(UserMetadata {
            issuer: data.issuer,
            email: data.email,
            public_address: data.public_address,
        })
    }
}
