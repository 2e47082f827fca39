//! Integration tests for authentication, sessions and active-role
//! resolution.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{
    assert_error, body_json, get_auth, post_auth, post_json, post_json_auth, sign_up, switch_role,
    PASSWORD,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use qgig_api::auth::jwt::{generate_access_token, Claims};
use qgig_core::roles::RoleName;
use qgig_db::{Store, StoreTx};
use serde_json::json;
use tower::ServiceExt;

async fn grant(app: &common::TestApp, user_id: i64, role: RoleName) {
    let mut tx: Box<dyn StoreTx> = app.state.store.begin().await.unwrap();
    tx.assign_role(user_id, role).await.unwrap();
    tx.commit().await.unwrap();
}

fn forged_claim(app: &common::TestApp, user_id: i64, claim: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: "professional".to_string(),
        active_role: Some(claim.to_string()),
        sid: None,
        exp: now + 3600,
        iat: now,
        jti: "forged".to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.state.config.jwt.secret.as_bytes()),
    )
    .unwrap()
}

async fn me_via_cookie(app: &axum::Router, session_token: &str) -> serde_json::Value {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/auth/me")
        .header(header::COOKIE, format!("qgig_session={session_token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Test: registration grants both market roles and both profiles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_grants_both_market_roles() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "dual").await;

    let me = body_json(get_auth(&app.router, "/api/v1/auth/me", &user.token).await).await;
    assert_eq!(me["data"]["roles"], json!(["professional", "institution"]));
    assert_eq!(me["data"]["active_role"], "professional");
    assert!(me["data"]["user"].get("password_hash").is_none());
    assert!(user.professional_id > 0);
    assert!(user.institution_id > 0);
}

// ---------------------------------------------------------------------------
// Test: registration and login failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = common::build_test_app();
    sign_up(&app.router, "taken").await;

    let response = post_json(
        &app.router,
        "/api/v1/auth/register",
        json!({ "email": "TAKEN@qgig.test", "password": PASSWORD }),
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "EMAIL_TAKEN").await;
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = common::build_test_app();
    let response = post_json(
        &app.router,
        "/api/v1/auth/register",
        json!({ "email": "short@qgig.test", "password": "abc" }),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "forgetful").await;

    let response = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "email": user.email, "password": "not-the-password" }),
    )
    .await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

#[tokio::test]
async fn disabled_account_cannot_log_in() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "suspended").await;

    let mut tx: Box<dyn StoreTx> = app.state.store.begin().await.unwrap();
    tx.set_user_active(user.user_id, false).await.unwrap();
    tx.commit().await.unwrap();

    let response = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "email": user.email, "password": PASSWORD }),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "ACCOUNT_DISABLED").await;

    let response = get_auth(&app.router, "/api/v1/auth/me", &user.token).await;
    assert_error(response, StatusCode::FORBIDDEN, "ACCOUNT_DISABLED").await;
}

// ---------------------------------------------------------------------------
// Test: missing or malformed credentials
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_credential_is_unauthorized() {
    let app = common::build_test_app();
    let response = common::get(&app.router, "/api/v1/auth/me").await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;

    let response = get_auth(&app.router, "/api/v1/auth/me", "not-a-jwt").await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}

// ---------------------------------------------------------------------------
// Test: the active role gates role-specific endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wrong_active_role_is_not_permitted() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "pro_only").await;

    let response = post_json_auth(
        &app.router,
        "/api/v1/jobs",
        &user.token,
        json!({
            "title": "Shift",
            "description": "Cover",
            "location": "Gulu",
            "pay_amount": 1000.0
        }),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "ROLE_NOT_PERMITTED").await;

    let token = switch_role(&app.router, &user, "institution").await;
    let response = get_auth(&app.router, "/api/v1/jobs/mine", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Test: a stale claim for an unassigned role is refused
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_admin_claim_is_not_assigned() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "pretender").await;

    let stale = generate_access_token(
        user.user_id,
        RoleName::Professional,
        Some(RoleName::Admin),
        None,
        &app.state.config.jwt,
    )
    .unwrap();

    let response = get_auth(&app.router, "/api/v1/admin/documents/pending", &stale).await;
    assert_error(response, StatusCode::FORBIDDEN, "ROLE_NOT_ASSIGNED").await;

    let response = post_json_auth(
        &app.router,
        "/api/v1/auth/switch-role",
        &stale,
        json!({ "role": "admin" }),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "ROLE_NOT_ASSIGNED").await;
}

#[tokio::test]
async fn unknown_role_claim_has_no_active_role() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "garbled").await;
    let token = forged_claim(&app, user.user_id, "superuser");

    let response = get_auth(&app.router, "/api/v1/jobs/assigned", &token).await;
    assert_error(response, StatusCode::FORBIDDEN, "NO_ACTIVE_ROLE").await;
}

// ---------------------------------------------------------------------------
// Test: admin is assignable but never switchable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_role_is_not_switchable() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "operator").await;
    grant(&app, user.user_id, RoleName::Admin).await;

    let response = post_json_auth(
        &app.router,
        "/api/v1/auth/switch-role",
        &user.token,
        json!({ "role": "admin" }),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "NON_SWITCHABLE_ROLE").await;

    let response = post_json_auth(
        &app.router,
        "/api/v1/auth/switch-role",
        &user.token,
        json!({ "role": "janitor" }),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

#[tokio::test]
async fn admin_can_assign_roles() {
    let app = common::build_test_app();
    let admin = sign_up(&app.router, "root").await;
    let target = sign_up(&app.router, "newcomer").await;
    grant(&app, admin.user_id, RoleName::Admin).await;

    let token = generate_access_token(
        admin.user_id,
        RoleName::Professional,
        Some(RoleName::Admin),
        None,
        &app.state.config.jwt,
    )
    .unwrap();

    let uri = format!("/api/v1/admin/users/{}/roles", target.user_id);
    let response = post_json_auth(&app.router, &uri, &token, json!({ "role": "admin" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["created"], true);

    let response = post_json_auth(&app.router, &uri, &token, json!({ "role": "admin" })).await;
    assert_eq!(body_json(response).await["data"]["created"], false);

    // A non-admin cannot.
    let response = post_json_auth(&app.router, &uri, &target.token, json!({ "role": "admin" })).await;
    assert_error(response, StatusCode::FORBIDDEN, "ROLE_NOT_PERMITTED").await;
}

// ---------------------------------------------------------------------------
// Test: bearer and cookie credentials share one session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn switch_is_visible_through_session_cookie() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "cookie_user").await;

    let me = me_via_cookie(&app.router, &user.session_token).await;
    assert_eq!(me["data"]["active_role"], "professional");

    switch_role(&app.router, &user, "institution").await;
    let me = me_via_cookie(&app.router, &user.session_token).await;
    assert_eq!(me["data"]["active_role"], "institution");
}

#[tokio::test]
async fn login_sets_http_only_cookie() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "cookie_check").await;

    let response = post_json(
        &app.router,
        "/api/v1/auth/login",
        json!({ "email": user.email, "password": PASSWORD }),
    )
    .await;
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("qgig_session="));
    assert!(cookie.contains("HttpOnly"));
}

// ---------------------------------------------------------------------------
// Test: logout ends the session behind the token
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_revokes_session() {
    let app = common::build_test_app();
    let user = sign_up(&app.router, "leaver").await;

    let response = post_auth(&app.router, "/api/v1/auth/logout", &user.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(&app.router, "/api/v1/auth/me", &user.token).await;
    assert_error(response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED").await;
}
