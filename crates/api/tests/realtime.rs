//! Integration tests for real-time delivery: channel membership, post-commit
//! pushes and inbound socket messages.

mod common;

use axum::http::StatusCode;
use common::{create_job, express_interest, institution, post_auth, professional, TestApp, TestUser};
use qgig_api::middleware::auth::{authenticate, Credential};
use qgig_api::ws::{handle_inbound, open_connection, plan_connection, ConnectionPlan};
use qgig_core::channels::ChannelKey;
use qgig_core::roles::RoleName;
use qgig_events::Outbound;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

async fn plan_for(app: &TestApp, user: &TestUser) -> ConnectionPlan {
    let ctx = authenticate(&app.state, Credential::Bearer(user.token.clone()))
        .await
        .unwrap();
    plan_connection(&app.state, &ctx).await.unwrap()
}

async fn connect(app: &TestApp, user: &TestUser, conn_id: &str) -> UnboundedReceiver<Outbound> {
    let plan = plan_for(app, user).await;
    open_connection(&app.state, conn_id, &plan).await.unwrap()
}

/// Every text frame queued so far, decoded.
fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Outbound::Text(text) = frame {
            frames.push(serde_json::from_str(&text).unwrap());
        }
    }
    frames
}

fn events(frames: &[Value]) -> Vec<&str> {
    frames.iter().map(|f| f["event"].as_str().unwrap()).collect()
}

// ---------------------------------------------------------------------------
// Test: connections join the personal and the active-role channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn plan_follows_active_role() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;

    let plan = plan_for(&app, &owner).await;
    assert_eq!(plan.role, Some(RoleName::Institution));
    assert_eq!(
        plan.channels,
        vec![
            ChannelKey::User(owner.user_id),
            ChannelKey::Institution(owner.institution_id)
        ]
    );

    let plan = plan_for(&app, &pro).await;
    assert_eq!(
        plan.channels,
        vec![
            ChannelKey::User(pro.user_id),
            ChannelKey::Professional(pro.professional_id)
        ]
    );
}

#[tokio::test]
async fn connected_frame_names_role_room() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;

    let mut rx = connect(&app, &owner, "conn-1").await;
    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["event"], "connected");
    assert_eq!(frames[0]["data"]["user_id"], owner.user_id);
    assert_eq!(frames[0]["data"]["role"], "institution");
    assert_eq!(
        frames[0]["data"]["room"],
        format!("institution_{}", owner.institution_id)
    );
    assert_eq!(app.state.registry.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: interest reaches the institution's user and role channels
// ---------------------------------------------------------------------------

#[tokio::test]
async fn interest_is_pushed_after_commit() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let mut rx = connect(&app, &owner, "owner-tab").await;
    drain(&mut rx);

    express_interest(&app.router, &pro, job_id).await;
    let frames = drain(&mut rx);
    let names = events(&frames);
    assert!(names.contains(&"notification"));
    assert!(names.contains(&"job_interest_sent"));

    let notification = frames.iter().find(|f| f["event"] == "notification").unwrap();
    assert_eq!(notification["room"], format!("user_{}", owner.user_id));
    assert_eq!(notification["data"]["title"], "New Interest in Your Job");

    // A failed duplicate commits nothing and pushes nothing.
    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/express-interest"),
        &pro.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn decision_reaches_professional_channel() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();
    let interest = express_interest(&app.router, &pro, job_id).await;

    let mut rx = connect(&app, &pro, "pro-tab").await;
    drain(&mut rx);

    common::accept_interest(&app.router, &owner, interest["id"].as_i64().unwrap()).await;
    let frames = drain(&mut rx);
    let decision = frames
        .iter()
        .find(|f| f["event"] == "interest_decision")
        .unwrap();
    assert_eq!(decision["room"], format!("professional_{}", pro.professional_id));
    assert!(events(&frames).contains(&"notification"));
}

// ---------------------------------------------------------------------------
// Test: inbound mark_notification_read marks and echoes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inbound_mark_read_echoes_on_user_channel() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();
    express_interest(&app.router, &pro, job_id).await;
    let id = common::notifications(&app.router, &owner).await[0]["id"]
        .as_i64()
        .unwrap();

    let mut rx = connect(&app, &owner, "owner-tab").await;
    drain(&mut rx);

    let text = format!(r#"{{"event":"mark_notification_read","data":{{"notification_id":{id}}}}}"#);
    handle_inbound(&app.state, owner.user_id, &text).await.unwrap();

    let frames = drain(&mut rx);
    assert_eq!(events(&frames), vec!["notification_read"]);
    assert_eq!(frames[0]["data"]["notification_id"], id);
    assert_eq!(frames[0]["data"]["unread_count"], 0);

    // Someone else's notification is refused.
    assert!(handle_inbound(&app.state, pro.user_id, &text).await.is_err());
    assert!(handle_inbound(&app.state, owner.user_id, "not json").await.is_err());
}

// ---------------------------------------------------------------------------
// Test: removed connections receive nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn removed_connection_is_skipped() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let mut rx = connect(&app, &owner, "owner-tab").await;
    drain(&mut rx);
    assert!(app.state.registry.remove("owner-tab").await);

    express_interest(&app.router, &pro, job_id).await;
    assert!(drain(&mut rx).is_empty());
    // The durable row is still there.
    assert_eq!(common::notifications(&app.router, &owner).await.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: a token claiming an unheld role gets no role channel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unheld_role_claim_joins_personal_channel_only() {
    use qgig_db::{Store, StoreTx};

    let mut config = common::test_config();
    config.legacy_role_policy = qgig_api::auth::roles::LegacyRolePolicy::LegacyOnly;
    let app = common::build_test_app_with(config);

    // Legacy professional with an institution profile but no institution role.
    let mut tx: Box<dyn StoreTx> = app.state.store.begin().await.unwrap();
    let user = tx
        .create_user(&qgig_db::models::user::CreateUser {
            email: "legacy@qgig.test".to_string(),
            username: "legacy".to_string(),
            password_hash: "unused".to_string(),
            role: RoleName::Professional,
        })
        .await
        .unwrap();
    tx.create_professional(user.id, "legacy").await.unwrap();
    tx.create_institution(user.id, "legacy").await.unwrap();
    tx.commit().await.unwrap();

    let token = qgig_api::auth::jwt::generate_access_token(
        user.id,
        RoleName::Professional,
        Some(RoleName::Institution),
        None,
        &app.state.config.jwt,
    )
    .unwrap();
    let ctx = authenticate(&app.state, Credential::Bearer(token))
        .await
        .unwrap();
    let plan = plan_connection(&app.state, &ctx).await.unwrap();
    assert_eq!(plan.channels, vec![ChannelKey::User(user.id)]);

    // The role it does hold still joins its channel.
    let token = qgig_api::auth::jwt::generate_access_token(
        user.id,
        RoleName::Professional,
        Some(RoleName::Professional),
        None,
        &app.state.config.jwt,
    )
    .unwrap();
    let ctx = authenticate(&app.state, Credential::Bearer(token))
        .await
        .unwrap();
    let plan = plan_connection(&app.state, &ctx).await.unwrap();
    assert_eq!(plan.channels.len(), 2);
    assert_eq!(plan.channels[0], ChannelKey::User(user.id));
    assert!(matches!(plan.channels[1], ChannelKey::Professional(_)));
}
