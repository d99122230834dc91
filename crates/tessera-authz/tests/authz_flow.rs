//! End-to-end flow: mint a signed token carrying compact permissions,
//! present it through a request context, and drive the full decision
//! surface.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use tessera_authz::{
    authorization_service, AuthzConfig, AuthzError, Catalog, DecodedPermissions, JwtClaimsParser,
    Permission, PermissionCodec, RequestContext, StudyGrant,
};

const SECRET: &[u8] = b"integration-secret";
const STUDY_ID: i64 = 1643;

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

fn granted_permissions() -> DecodedPermissions {
    DecodedPermissions {
        globals: BTreeSet::from(["dashboard.access".to_string()]),
        studies: vec![StudyGrant {
            study_id: STUDY_ID,
            activities: BTreeSet::from([
                "qc.view.results".to_string(),
                "upload.data".to_string(),
            ]),
        }],
    }
}

fn service() -> Arc<dyn tessera_authz::AuthorizationService> {
    authorization_service(
        &AuthzConfig::default(),
        Arc::new(JwtClaimsParser::hs256(SECRET)),
    )
}

#[test]
fn generation_a_token_flows_end_to_end() {
    let codec = PermissionCodec::new(Catalog::shared());
    let prm = codec
        .encode_very_compact(&granted_permissions())
        .expect("encode");
    let token = mint(&json!({
        "jti": "42",
        "sub": "reader@example.org",
        "exp": far_future(),
        "prm": prm,
    }));

    let service = service();
    let ctx = RequestContext::from_authorization_header(Some(format!("Bearer {token}")));

    service.check_is_authenticated(&ctx).expect("authenticated");
    service
        .check_access(&ctx, &[Permission::DASHBOARD_ACCESS])
        .expect("global grant");
    service
        .check_study_access(&ctx, STUDY_ID, &[Permission::QC_VIEW_RESULTS])
        .expect("study grant");

    assert!(matches!(
        service.check_access(&ctx, &[Permission::CONFIGURATION_STUDY_DELETE]),
        Err(AuthzError::AccessDenied)
    ));
    assert!(matches!(
        service.check_study_access(&ctx, STUDY_ID + 1, &[Permission::QC_VIEW_RESULTS]),
        Err(AuthzError::AccessDenied)
    ));

    let user = service.user(&ctx).expect("user");
    assert_eq!(user.id, 42);
    assert_eq!(user.username, "reader@example.org");
    assert_eq!(service.jwt_token(&ctx).expect("token"), token);
    assert_eq!(user, service.user_from_token(&token).expect("direct token"));
}

#[test]
fn generation_b_token_flows_end_to_end() {
    let codec = PermissionCodec::new(Catalog::shared());
    let permissions = codec
        .encode_dictionary(&granted_permissions())
        .expect("encode");
    let token = mint(&json!({
        "jti": "7",
        "sub": "qc@example.org",
        "exp": far_future(),
        "permissions": permissions,
    }));

    let service = service();
    let ctx = RequestContext::with_bearer(token);

    service
        .check_access(&ctx, &[Permission::DASHBOARD_ACCESS])
        .expect("global grant");
    service
        .check_study_access(&ctx, STUDY_ID, &[Permission::UPLOAD_DATA])
        .expect("study grant");
    assert!(matches!(
        service.check_study_access(&ctx, STUDY_ID, &[Permission::QC_CREATE_EDCF]),
        Err(AuthzError::AccessDenied)
    ));
}

#[test]
fn uncompressed_legacy_token_flows_end_to_end() {
    let token = mint(&json!({
        "jti": "8",
        "sub": "legacy@example.org",
        "exp": far_future(),
        "permissions": {
            "globals": ["dashboard.access"],
            "activities": [
                {"projectId": STUDY_ID, "activities": ["qc.view.results"]}
            ]
        },
    }));

    let service = service();
    let ctx = RequestContext::with_bearer(token);

    service
        .check_access(&ctx, &[Permission::DASHBOARD_ACCESS])
        .expect("global grant");
    service
        .check_study_access(&ctx, STUDY_ID, &[Permission::QC_VIEW_RESULTS])
        .expect("study grant");
}

#[test]
fn requests_without_a_token_are_rejected() {
    let service = service();
    let ctx = RequestContext::detached();
    assert!(matches!(
        service.check_is_authenticated(&ctx),
        Err(AuthzError::NotAuthenticated)
    ));
    assert!(matches!(
        service.user(&ctx),
        Err(AuthzError::NotAuthenticated)
    ));
    assert_eq!(service.optional_user(&ctx).expect("optional"), None);
}

#[test]
fn tampered_token_is_rejected() {
    let token = mint(&json!({
        "jti": "42",
        "sub": "reader@example.org",
        "exp": far_future(),
        "prm": {"glb": "", "vcp": ""},
    }));
    let mut tampered = token.clone();
    tampered.pop();

    let service = service();
    let ctx = RequestContext::with_bearer(tampered);
    assert!(matches!(
        service.check_is_authenticated(&ctx),
        Err(AuthzError::NotAuthenticated)
    ));
}

#[test]
fn disabled_deployment_substitutes_the_placeholder_identity() {
    let service = authorization_service(
        &AuthzConfig {
            enabled: false,
            secret: None,
        },
        Arc::new(JwtClaimsParser::hs256(SECRET)),
    );
    let ctx = RequestContext::detached();

    service
        .check_access(&ctx, &[Permission::CONFIGURATION_STUDY_DELETE])
        .expect("noop grants");
    let user = service.user(&ctx).expect("placeholder user");
    assert_eq!(user.id, 0);
    assert_eq!(user.username, "__fake_user__");
}
