//! Factory: build `IdentityVerifier` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::identity::{
    IdentityVerifier, MagicProvider, did_token::DidTokenPolicy,
};

pub fn build_identity_verifier(config: &Config) -> anyhow::Result<Arc<IdentityVerifier>> {
    let http = reqwest::Client::builder().build()?;

    let policy = DidTokenPolicy {
        client_id: config.magic_client_id.clone(),
        nbf_grace_seconds: i64::try_from(config.did_token_nbf_grace_seconds)?,
    };

    let provider = MagicProvider::new(
        http,
        config.magic_api_base_url.clone(),
        config.magic_secret_key.clone(),
        policy,
    );

    Ok(Arc::new(IdentityVerifier::new(Arc::new(provider))))
}
