//! In-process identity provider for tests.
//!
//! Token table:
//! - `token-a` / `token-b`: valid, resolve to `a@x.com` / `b@y.com`
//! - `token-user-<n>`: valid, resolves to `user<n>@example.com`
//! - `token-expired`: parses, fails validation
//! - `token-unknown`: valid, issuer unknown to the provider
//! - `token-phone`: valid, metadata has no email
//! - anything else: malformed
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::services::identity::provider::{
    IdentityProvider, LookupError, ParseError, ParsedToken, UserMetadata, ValidationError,
};

pub const TOKEN_A: &str = "token-a";
pub const TOKEN_B: &str = "token-b";
pub const TOKEN_EXPIRED: &str = "token-expired";

struct FakeToken {
    issuer: String,
    expired: bool,
}

impl ParsedToken for FakeToken {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.expired {
            return Err(ValidationError::Expired { ext: 0 });
        }
        Ok(())
    }

    fn issuer(&self) -> &str {
        &self.issuer
    }
}

#[derive(Debug, Default)]
pub struct FakeProvider {
    pub lookups: AtomicUsize,
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn parse_token(&self, raw: &str) -> Result<Box<dyn ParsedToken>, ParseError> {
        let (issuer, expired) = match raw {
            TOKEN_A => ("did:ethr:0xaaa".to_string(), false),
            TOKEN_B => ("did:ethr:0xbbb".to_string(), false),
            TOKEN_EXPIRED => ("did:ethr:0xaaa".to_string(), true),
            "token-unknown" => ("did:ethr:0xdead".to_string(), false),
            "token-phone" => ("did:ethr:0xphone".to_string(), false),
            other => match other.strip_prefix("token-user-") {
                Some(n) => (format!("did:ethr:0xuser{n}"), false),
                None => return Err(ParseError::Structure("unknown test token")),
            },
        };
        Ok(Box::new(FakeToken { issuer, expired }))
    }

    async fn metadata_by_issuer(&self, issuer: &str) -> Result<UserMetadata, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let email = match issuer {
            "did:ethr:0xaaa" => Some("a@x.com".to_string()),
            "did:ethr:0xbbb" => Some("b@y.com".to_string()),
            "did:ethr:0xphone" => None,
            other => match other.strip_prefix("did:ethr:0xuser") {
                Some(n) => Some(format!("user{n}@example.com")),
                None => return Err(LookupError::Rejected("unknown issuer".to_string())),
            },
        };

        Ok(UserMetadata {
            issuer: issuer.to_string(),
            email,
            public_address: None,
        })
    }
}
