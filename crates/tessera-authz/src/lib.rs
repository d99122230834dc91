//! Tessera authn/authz primitives shared by the service fleet.
//!
//! # Purpose
//! Issues and evaluates fine-grained, per-study authorization decisions
//! while keeping the permission data compact enough to live inside a signed
//! access token: an integer/string alphabet codec, the versioned permission
//! catalog, two generations of compact permission serialization, and the
//! decision engine that evaluates global and per-study permission sets.
//!
//! # How it fits
//! Token issuers use the codec's encode direction when minting; every other
//! service decodes the claims it receives and asks the engine yes/no
//! questions. Signature verification stays behind the [`ClaimsParser`]
//! seam.
//!
//! # Key invariants
//! - Permission codes are stable forever; unknown codes decode to inert
//!   opaque strings instead of failing, so catalog versions can skew
//!   between services.
//! - One alphabet instance serves both directions of the codec; claim
//!   delimiters can never appear inside encoded output.
//! - Decisions are pure and deterministic; authorization is never retried.
//!
//! # Examples
//! ```rust
//! use tessera_authz::{Catalog, Permission};
//!
//! let catalog = Catalog::shared();
//! let permission = catalog
//!     .lookup_by_name("dashboard.access")
//!     .expect("published permission");
//! assert_eq!(permission, Permission::DASHBOARD_ACCESS);
//! ```
//!
//! # Common pitfalls
//! - Decoding with a different alphabet than the one used for encoding
//!   yields wrong numbers without an error; keep one codec per wire format.
//! - The no-op service must be selected via [`config::authorization_service`],
//!   never by branching inside request handlers.

mod alphabet;
mod catalog;
mod claims;
mod codec;
pub mod config;
mod engine;
mod errors;
mod parser;

pub use alphabet::AlphabetEncoder;
pub use catalog::{Catalog, Permission};
pub use claims::{
    DecodedPermissions, DictionaryClaim, PermissionsClaim, StudyGrant, UncompressedClaim,
    UncompressedStudy, VeryCompactClaim,
};
pub use codec::PermissionCodec;
pub use config::{authorization_service, authorization_service_from_env, AuthzConfig};
pub use engine::{
    AuthorizationService, NoOpAuthorizationService, RequestContext, SimpleAuthorizationService,
    UserDetails,
};
pub use errors::{AuthzError, AuthzResult};
pub use parser::{Claims, ClaimsParser, JwtClaimsParser};
