//! Claim extraction collaborator.
//!
//! Signature verification itself lives behind the [`ClaimsParser`] trait so
//! the decision engine never touches key material; the default
//! implementation wraps `jsonwebtoken`. Any parse failure is surfaced as
//! [`AuthzError::NotAuthenticated`]: from the engine's point of view a token
//! that cannot be read is a token that is not there.
use crate::{AuthzError, AuthzResult};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// The parsed claim set of one access token.
///
/// Identity is carried in the registered claims: the numeric user id in
/// `jti`, the username in `sub`. Everything else, including the permission
/// payload, stays in `extra` for the codec to interpret.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Verifies a raw token string and yields its claims.
pub trait ClaimsParser: Send + Sync {
    fn parse(&self, token: &str) -> AuthzResult<Claims>;
}

/// `jsonwebtoken`-backed parser.
pub struct JwtClaimsParser {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtClaimsParser {
    /// Parser for HS256 tokens signed with a shared secret.
    pub fn hs256(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Audience is enforced by the gateway, not by this library.
        validation.validate_aud = false;
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Parser over an explicit key and validation policy, for deployments
    /// using asymmetric signatures.
    pub fn new(decoding_key: DecodingKey, validation: Validation) -> Self {
        Self {
            decoding_key,
            validation,
        }
    }
}

impl ClaimsParser for JwtClaimsParser {
    fn parse(&self, token: &str) -> AuthzResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                warn!(error = %err, "can't parse jwt token");
                AuthzError::NotAuthenticated
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"test-secret";

    fn mint(claims: &Value) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("mint token")
    }

    fn far_future() -> i64 {
        4_102_444_800 // 2100-01-01
    }

    #[test]
    fn parses_registered_and_extra_claims() {
        let token = mint(&json!({
            "jti": "42",
            "sub": "reader@example.org",
            "exp": far_future(),
            "prm": {"glb": "V0", "vcp": ""}
        }));
        let claims = JwtClaimsParser::hs256(SECRET).parse(&token).expect("parse");
        assert_eq!(claims.jti.as_deref(), Some("42"));
        assert_eq!(claims.sub.as_deref(), Some("reader@example.org"));
        assert!(claims.extra.contains_key("prm"));
    }

    #[test]
    fn garbage_token_is_not_authenticated() {
        let err = JwtClaimsParser::hs256(SECRET)
            .parse("not.a.token")
            .expect_err("reject");
        assert!(matches!(err, AuthzError::NotAuthenticated));
    }

    #[test]
    fn wrong_secret_is_not_authenticated() {
        let token = mint(&json!({"jti": "1", "sub": "x", "exp": far_future()}));
        let err = JwtClaimsParser::hs256(b"other-secret")
            .parse(&token)
            .expect_err("reject");
        assert!(matches!(err, AuthzError::NotAuthenticated));
    }

    #[test]
    fn expired_token_is_not_authenticated() {
        let token = mint(&json!({"jti": "1", "sub": "x", "exp": 1_000}));
        let err = JwtClaimsParser::hs256(SECRET)
            .parse(&token)
            .expect_err("reject");
        assert!(matches!(err, AuthzError::NotAuthenticated));
    }
}
