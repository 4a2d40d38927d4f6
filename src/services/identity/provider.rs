//! External identity-provider seam.
//!
//! The verifier only talks to the provider through these traits, so the Magic
//! admin API can be swapped for a fake in tests (or another DID issuer later).
use async_trait::async_trait;
use thiserror::Error;

/// Token could not be decoded into the provider's token structure.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("token is not valid base64")]
    Encoding(#[from] base64::DecodeError),

    #[error("token payload is not valid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token structure is invalid: {0}")]
    Structure(&'static str),
}

/// Token decoded fine but must not be trusted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("token expired at {ext}")]
    Expired { ext: i64 },

    #[error("token not valid before {nbf}")]
    NotYetValid { nbf: i64 },

    #[error("token audience does not match")]
    AudienceMismatch,

    #[error("token proof is malformed")]
    InvalidProof,

    #[error("token proof was not signed by the issuer")]
    SignatureMismatch,
}

/// Provider could not resolve user metadata for an issuer.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("provider rejected lookup: {0}")]
    Rejected(String),

    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),
}

/// Subject metadata returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMetadata {
    pub issuer: String,
    pub email: Option<String>,
    pub public_address: Option<String>,
}

pub trait ParsedToken: Send + Sync {
    fn validate(&self) -> Result<(), ValidationError>;

    fn issuer(&self) -> &str;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    // Used for logging only.
    fn provider_name(&self) -> &'static str;

    fn parse_token(&self, raw: &str) -> Result<Box<dyn ParsedToken>, ParseError>;

    async fn metadata_by_issuer(&self, issuer: &str) -> Result<UserMetadata, LookupError>;
}
