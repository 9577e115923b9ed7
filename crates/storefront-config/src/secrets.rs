//! Shared secrets for privileged endpoints.
//!
//! # Environment Variables
//!
//! - `INVALIDATION_WEBHOOK_SECRET`: bearer secret expected from upstream
//!   systems calling the invalidation webhook
//! - `CACHE_ADMIN_TOKEN`: bearer token for the cache administration endpoints
//!
//! Both are optional. An endpoint whose secret is unset rejects every request.

use std::env;
use tracing::warn;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretsConfig {
    pub webhook_secret: Option<String>,
    pub admin_token: Option<String>,
}

impl SecretsConfig {
    pub fn from_env() -> Self {
        let config = Self {
            webhook_secret: non_empty_var("INVALIDATION_WEBHOOK_SECRET"),
            admin_token: non_empty_var("CACHE_ADMIN_TOKEN"),
        };

        if config.webhook_secret.is_none() {
            warn!("INVALIDATION_WEBHOOK_SECRET not set, invalidation webhook will reject all calls");
        }
        if config.admin_token.is_none() {
            warn!("CACHE_ADMIN_TOKEN not set, cache administration is disabled");
        }
        config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// Secrets must never reach logs through `#[instrument]` or `{:?}`.
impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let config = SecretsConfig {
            webhook_secret: Some("hook-secret".into()),
            admin_token: None,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hook-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
