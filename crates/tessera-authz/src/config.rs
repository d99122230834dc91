//! Service wiring configuration.
//!
//! Whether authorization is enforced at all is a deployment decision; the
//! factory here swaps the whole service implementation rather than
//! threading an `enabled` flag through the engine.
use crate::catalog::Catalog;
use crate::engine::{AuthorizationService, NoOpAuthorizationService, SimpleAuthorizationService};
use crate::parser::{ClaimsParser, JwtClaimsParser};
use std::sync::Arc;

// Authorization configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct AuthzConfig {
    /// Enforce authorization checks. Defaults to `true`; local deployments
    /// opt out explicitly.
    pub enabled: bool,
    /// Shared HS256 secret for the default token parser.
    pub secret: Option<String>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            secret: None,
        }
    }
}

impl AuthzConfig {
    pub fn from_env() -> Self {
        // Anything that does not explicitly opt out keeps enforcement on.
        let enabled = std::env::var("AUTHZ_ENABLED")
            .map(|value| {
                !matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "false" | "0" | "no" | "off"
                )
            })
            .unwrap_or(true);
        let secret = std::env::var("AUTHZ_JWT_SECRET").ok();
        Self { enabled, secret }
    }
}

/// Build the authorization service selected by configuration: the real
/// engine when enforcement is on, the no-op substitute otherwise. Both
/// share the process-wide catalog.
pub fn authorization_service(
    config: &AuthzConfig,
    parser: Arc<dyn ClaimsParser>,
) -> Arc<dyn AuthorizationService> {
    let engine = SimpleAuthorizationService::new(parser, Catalog::shared());
    if config.enabled {
        Arc::new(engine)
    } else {
        Arc::new(NoOpAuthorizationService::new(engine))
    }
}

/// Convenience wiring for HS256 deployments configured entirely from the
/// environment.
pub fn authorization_service_from_env() -> Arc<dyn AuthorizationService> {
    let config = AuthzConfig::from_env();
    let secret = config.secret.clone().unwrap_or_default();
    let parser = Arc::new(JwtClaimsParser::hs256(secret.as_bytes()));
    authorization_service(&config, parser)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RequestContext;

    // Single test for all env permutations; splitting it up would let the
    // parallel test runner race on the shared variables.
    #[test]
    fn from_env_reads_and_normalizes_the_variables() {
        std::env::remove_var("AUTHZ_ENABLED");
        std::env::remove_var("AUTHZ_JWT_SECRET");
        let config = AuthzConfig::from_env();
        assert!(config.enabled);
        assert!(config.secret.is_none());

        for opt_out in ["false", "FALSE", " False ", "0", "no", "off"] {
            std::env::set_var("AUTHZ_ENABLED", opt_out);
            assert!(!AuthzConfig::from_env().enabled, "{opt_out:?}");
        }
        for opt_in in ["true", "TRUE", "1", "yes", "anything-else"] {
            std::env::set_var("AUTHZ_ENABLED", opt_in);
            assert!(AuthzConfig::from_env().enabled, "{opt_in:?}");
        }

        std::env::set_var("AUTHZ_JWT_SECRET", "hunter2");
        assert_eq!(AuthzConfig::from_env().secret.as_deref(), Some("hunter2"));

        std::env::remove_var("AUTHZ_ENABLED");
        std::env::remove_var("AUTHZ_JWT_SECRET");
    }

    #[test]
    fn default_config_enforces_authorization() {
        let config = AuthzConfig::default();
        assert!(config.enabled);
        assert!(config.secret.is_none());
    }

    #[test]
    fn disabled_config_selects_the_noop_service() {
        let parser = Arc::new(JwtClaimsParser::hs256(b"secret"));
        let config = AuthzConfig {
            enabled: false,
            secret: None,
        };
        let service = authorization_service(&config, parser);
        // The no-op variant waves a detached caller straight through.
        service
            .check_is_authenticated(&RequestContext::detached())
            .expect("noop grants");
    }

    #[test]
    fn enabled_config_selects_the_enforcing_service() {
        let parser = Arc::new(JwtClaimsParser::hs256(b"secret"));
        let service = authorization_service(&AuthzConfig::default(), parser);
        assert!(service
            .check_is_authenticated(&RequestContext::detached())
            .is_err());
    }
}
