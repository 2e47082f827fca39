//! Tests for the periodic gig expiry sweep.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, get, institution, post_json_auth};
use qgig_api::background::job_expiry;
use serde_json::json;
use tokio_util::sync::CancellationToken;

async fn post_with_expiry(
    app: &common::TestApp,
    owner: &common::TestUser,
    title: &str,
    expiry: chrono::DateTime<Utc>,
) -> i64 {
    let response = post_json_auth(
        &app.router,
        "/api/v1/jobs",
        &owner.token,
        json!({
            "title": title,
            "description": "Weekend theatre cover",
            "location": "Entebbe",
            "pay_amount": 90000.0,
            "expiry_date": expiry.to_rfc3339()
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Test: a sweep closes only open gigs past their expiry date
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_closes_expired_gigs() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "entebbe_general").await;
    let stale = post_with_expiry(&app, &owner, "Stale", Utc::now() - chrono::Duration::hours(1)).await;
    let fresh = post_with_expiry(&app, &owner, "Fresh", Utc::now() + chrono::Duration::days(3)).await;

    assert_eq!(job_expiry::sweep(&app.state).await.unwrap(), 1);

    let job = body_json(get(&app.router, &format!("/api/v1/jobs/{stale}")).await).await;
    assert_eq!(job["data"]["status"], "closed");
    let job = body_json(get(&app.router, &format!("/api/v1/jobs/{fresh}")).await).await;
    assert_eq!(job["data"]["status"], "open");

    // Already closed: nothing left to do.
    assert_eq!(job_expiry::sweep(&app.state).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Test: the sweep loop stops on cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_loop_stops_when_cancelled() {
    let app = common::build_test_app();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(job_expiry::run(
        app.state.clone(),
        Duration::from_millis(10),
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("sweep loop should stop promptly")
        .unwrap();
}
