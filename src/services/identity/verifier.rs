/*
 * Responsibility
 * - bearer credential → 検証済み Identity への変換
 * - provider のエラーを AuthError (MissingCredential / MalformedToken / InvalidToken /
 *   IdentityLookupFailed) に畳み込む
 * - キャッシュは持たない (毎回 provider に問い合わせる)
 */
use std::sync::Arc;

use thiserror::Error;

use crate::services::identity::provider::IdentityProvider;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("bearer credential is missing")]
    MissingCredential,
    #[error("token is malformed")]
    MalformedToken,
    #[error("token is invalid")]
    InvalidToken,
    #[error("identity lookup failed")]
    IdentityLookupFailed,
}

/// Verified subject. Only the verifier hands these out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    email: String,
    issuer: String,
}

impl Identity {
    pub(in crate::services::identity) fn verified(
        email: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            issuer: issuer.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

/// Pulls the token out of an `Authorization` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .ok_or(AuthError::MissingCredential)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

#[derive(Clone)]
pub struct IdentityVerifier {
    provider: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityVerifier")
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

impl IdentityVerifier {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub async fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let token = self.provider.parse_token(credential).map_err(|err| {
            tracing::warn!(error = %err, "malformed identity token");
            AuthError::MalformedToken
        })?;

        token.validate().map_err(|err| {
            tracing::warn!(error = %err, issuer = token.issuer(), "identity token failed validation");
            AuthError::InvalidToken
        })?;

        let metadata = self
            .provider
            .metadata_by_issuer(token.issuer())
            .await
            .map_err(|err| {
                tracing::warn!(
                    error = %err,
                    issuer = token.issuer(),
                    provider = self.provider.provider_name(),
                    "identity metadata lookup failed"
                );
                AuthError::IdentityLookupFailed
            })?;

        // Phone/SMS logins come back without an email; ownership is keyed by email.
        let email = metadata
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                tracing::warn!(issuer = token.issuer(), "identity has no email");
                AuthError::IdentityLookupFailed
            })?;

        tracing::debug!(
            issuer = %metadata.issuer,
            public_address = ?metadata.public_address,
            "identity verified"
        );

        Ok(Identity::verified(email, metadata.issuer))
    }

    /// Header-level entry point used by the auth middleware.
    pub async fn verify_header(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = extract_bearer(header)?;
        self.verify(token).await
    }
}
