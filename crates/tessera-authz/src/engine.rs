//! The authorization decision engine.
//!
//! # Purpose
//! Answers yes/no access questions from the decoded token permissions and
//! resolves the caller's identity.
//!
//! # How it fits
//! HTTP handlers pass a [`RequestContext`] built from the incoming request;
//! background consumers (queue workers) hand the raw token string to
//! [`AuthorizationService::user_from_token`] directly. The engine never
//! reaches for any ambient per-request state.
//!
//! # Key invariants
//! - Checks are pure functions of (claims, requested permissions, study id);
//!   nothing is cached and nothing is retried.
//! - A study the token does not mention grants nothing there; that is a
//!   denial, not an error.
//! - Identity is all-or-nothing: a user id that does not parse as a number
//!   means the caller is not authenticated.
//! - Enabled/disabled deployments swap the whole service implementation;
//!   the engine itself carries no conditional bypass logic.
use crate::catalog::{Catalog, Permission};
use crate::claims::{DecodedPermissions, PermissionsClaim};
use crate::codec::PermissionCodec;
use crate::parser::{Claims, ClaimsParser};
use crate::{AuthzError, AuthzResult};
use std::sync::Arc;
use tracing::{debug, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// Explicit request-scoped value carrying the `Authorization` header of the
/// current request, if any. Detached (non-HTTP) callers use
/// [`RequestContext::detached`] or skip the context entirely via
/// [`AuthorizationService::user_from_token`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    authorization: Option<String>,
}

impl RequestContext {
    /// Context for a request carrying the given `Authorization` header
    /// value, which may be absent.
    pub fn from_authorization_header(header: Option<impl Into<String>>) -> Self {
        Self {
            authorization: header.map(Into::into),
        }
    }

    /// Context wrapping a bare token, for callers that already stripped the
    /// header themselves.
    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            authorization: Some(format!("{BEARER_PREFIX}{}", token.into())),
        }
    }

    /// Context of a caller with no HTTP request at hand.
    pub fn detached() -> Self {
        Self::default()
    }

    /// The bearer token of this request, with the `Bearer ` prefix
    /// stripped. Blank headers count as absent.
    pub fn bearer_token(&self) -> Option<String> {
        let header = self.authorization.as_deref()?.trim();
        if header.is_empty() {
            return None;
        }
        let token = header.strip_prefix(BEARER_PREFIX).unwrap_or(header).trim();
        if token.is_empty() {
            return None;
        }
        Some(token.to_string())
    }
}

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub id: i64,
    pub username: String,
}

/// The authorization surface consumed by the rest of the system.
///
/// `user` and `jwt_token` are derived accessors with the same semantics for
/// every implementation, hence the default bodies.
pub trait AuthorizationService: Send + Sync {
    /// Succeeds iff the request carries a parseable token.
    fn check_is_authenticated(&self, ctx: &RequestContext) -> AuthzResult<()>;

    /// Succeeds iff the caller holds at least one of the given global
    /// permissions.
    fn check_access(&self, ctx: &RequestContext, permissions: &[Permission]) -> AuthzResult<()>;

    /// Succeeds iff the caller holds at least one of the given permissions
    /// on the given study.
    fn check_study_access(
        &self,
        ctx: &RequestContext,
        study_id: i64,
        permissions: &[Permission],
    ) -> AuthzResult<()>;

    /// The caller's identity, or `None` when the request carries no (valid)
    /// token. Non-authentication failures still propagate.
    fn optional_user(&self, ctx: &RequestContext) -> AuthzResult<Option<UserDetails>>;

    /// Identity resolution for non-HTTP callers: the token is passed
    /// explicitly instead of being read from a request context.
    fn user_from_token(&self, token: &str) -> AuthzResult<UserDetails>;

    /// The raw bearer token of the current request, if present.
    fn optional_jwt_token(&self, ctx: &RequestContext) -> Option<String>;

    fn user(&self, ctx: &RequestContext) -> AuthzResult<UserDetails> {
        self.optional_user(ctx)?.ok_or(AuthzError::NotAuthenticated)
    }

    fn jwt_token(&self, ctx: &RequestContext) -> AuthzResult<String> {
        self.optional_jwt_token(ctx)
            .ok_or(AuthzError::NotAuthenticated)
    }
}

/// The production engine: parses the token, decodes its compact permission
/// payload and intersects it with the requested permission names.
pub struct SimpleAuthorizationService {
    parser: Arc<dyn ClaimsParser>,
    codec: PermissionCodec,
}

impl SimpleAuthorizationService {
    pub fn new(parser: Arc<dyn ClaimsParser>, catalog: Arc<Catalog>) -> Self {
        Self {
            parser,
            codec: PermissionCodec::new(catalog),
        }
    }

    fn claims(&self, ctx: &RequestContext) -> AuthzResult<Claims> {
        let token = self.optional_jwt_token(ctx).ok_or_else(|| {
            debug!("no bearer token in request context");
            AuthzError::NotAuthenticated
        })?;
        self.parser.parse(&token)
    }

    fn decoded_permissions(&self, claims: &Claims) -> AuthzResult<DecodedPermissions> {
        let claim = PermissionsClaim::detect(&claims.extra)?;
        self.codec.decode(&claim)
    }
}

impl AuthorizationService for SimpleAuthorizationService {
    fn check_is_authenticated(&self, ctx: &RequestContext) -> AuthzResult<()> {
        self.claims(ctx).map(|_| ())
    }

    fn check_access(&self, ctx: &RequestContext, permissions: &[Permission]) -> AuthzResult<()> {
        let claims = self.claims(ctx)?;
        let decoded = self.decoded_permissions(&claims)?;
        if permissions
            .iter()
            .any(|permission| decoded.globals.contains(permission.name))
        {
            Ok(())
        } else {
            Err(AuthzError::AccessDenied)
        }
    }

    fn check_study_access(
        &self,
        ctx: &RequestContext,
        study_id: i64,
        permissions: &[Permission],
    ) -> AuthzResult<()> {
        let claims = self.claims(ctx)?;
        let decoded = self.decoded_permissions(&claims)?;
        // An unmentioned study implicitly grants nothing there.
        let granted = decoded.study(study_id).map(|grant| {
            permissions
                .iter()
                .any(|permission| grant.activities.contains(permission.name))
        });
        if granted.unwrap_or(false) {
            Ok(())
        } else {
            Err(AuthzError::AccessDenied)
        }
    }

    fn optional_user(&self, ctx: &RequestContext) -> AuthzResult<Option<UserDetails>> {
        let Some(token) = self.optional_jwt_token(ctx) else {
            return Ok(None);
        };
        match self.user_from_token(&token) {
            Ok(user) => Ok(Some(user)),
            Err(AuthzError::NotAuthenticated) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn user_from_token(&self, token: &str) -> AuthzResult<UserDetails> {
        let claims = self.parser.parse(token)?;
        let raw_id = claims.jti.as_deref().unwrap_or_default();
        let id = raw_id.parse::<i64>().map_err(|_| {
            warn!(jti = raw_id, "can't convert user id to a number");
            AuthzError::NotAuthenticated
        })?;
        Ok(UserDetails {
            id,
            username: claims.sub.unwrap_or_default(),
        })
    }

    fn optional_jwt_token(&self, ctx: &RequestContext) -> Option<String> {
        ctx.bearer_token()
    }
}

/// Drop-in substitute for local/disabled-authorization deployments: every
/// check succeeds, and identity falls back to a fixed placeholder when the
/// request carries no real token. Selected by configuration only (see
/// [`crate::config::authorization_service`]).
pub struct NoOpAuthorizationService {
    inner: SimpleAuthorizationService,
}

impl NoOpAuthorizationService {
    pub fn new(inner: SimpleAuthorizationService) -> Self {
        Self { inner }
    }

    fn placeholder_user() -> UserDetails {
        UserDetails {
            id: 0,
            username: "__fake_user__".to_string(),
        }
    }
}

impl AuthorizationService for NoOpAuthorizationService {
    fn check_is_authenticated(&self, _ctx: &RequestContext) -> AuthzResult<()> {
        Ok(())
    }

    fn check_access(&self, _ctx: &RequestContext, _permissions: &[Permission]) -> AuthzResult<()> {
        Ok(())
    }

    fn check_study_access(
        &self,
        _ctx: &RequestContext,
        _study_id: i64,
        _permissions: &[Permission],
    ) -> AuthzResult<()> {
        Ok(())
    }

    fn optional_user(&self, ctx: &RequestContext) -> AuthzResult<Option<UserDetails>> {
        let user = self
            .inner
            .optional_user(ctx)?
            .unwrap_or_else(Self::placeholder_user);
        Ok(Some(user))
    }

    fn user_from_token(&self, token: &str) -> AuthzResult<UserDetails> {
        self.inner.user_from_token(token)
    }

    fn optional_jwt_token(&self, ctx: &RequestContext) -> Option<String> {
        self.inner.optional_jwt_token(ctx)
    }
}
