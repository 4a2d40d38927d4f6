pub mod did_token;
pub mod factory;
pub mod magic;
pub mod provider;
#[cfg(test)]
pub mod testing;
pub mod verifier;

pub use factory::build_identity_verifier;
pub use magic::MagicProvider;
pub use verifier::{AuthError, Identity, IdentityVerifier};
