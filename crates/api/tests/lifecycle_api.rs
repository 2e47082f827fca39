//! HTTP-level integration tests for the gig lifecycle: posting, interest,
//! decisions, closing and deletion.

mod common;

use axum::http::StatusCode;
use common::{
    accept_interest, assert_error, body_json, create_job, delete_auth, express_interest, get,
    get_auth, institution, notifications, post_auth, post_json_auth, professional,
};
use serde_json::json;

fn titles(list: &[serde_json::Value]) -> Vec<String> {
    list.iter()
        .map(|n| n["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Test: expressing interest creates a pending interest and notifies the owner
// ---------------------------------------------------------------------------

#[tokio::test]
async fn express_interest_notifies_institution() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;

    let job = create_job(&app.router, &owner, "ICU night shift").await;
    assert_eq!(job["status"], "open");
    assert!(job["assigned_professional_id"].is_null());
    let job_id = job["id"].as_i64().unwrap();

    let interest = express_interest(&app.router, &pro, job_id).await;
    assert_eq!(interest["status"], "pending");
    assert_eq!(interest["job_id"], job_id);
    assert_eq!(interest["professional_id"], pro.professional_id);

    let inbox = notifications(&app.router, &owner).await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0]["title"], "New Interest in Your Job");
    assert_eq!(inbox[0]["interest_id"], interest["id"]);
    assert_eq!(inbox[0]["is_read"], false);
}

// ---------------------------------------------------------------------------
// Test: a second expression of interest is rejected without a second row
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_interest_is_rejected() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    express_interest(&app.router, &pro, job_id).await;
    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/express-interest"),
        &pro.token,
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "DUPLICATE_INTEREST").await;

    let response = get_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/interests"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: concurrent duplicate expressions yield one success and one conflict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_duplicate_interest_has_one_winner() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/v1/jobs/{job_id}/express-interest");
    let (a, b) = tokio::join!(
        post_auth(&app.router, &uri, &pro.token),
        post_auth(&app.router, &uri, &pro.token),
    );

    let mut statuses = vec![a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let inbox = notifications(&app.router, &owner).await;
    assert_eq!(inbox.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: accepting assigns the gig and notifies the professional
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accept_assigns_job_and_notifies_professional() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();
    let interest = express_interest(&app.router, &pro, job_id).await;
    let interest_id = interest["id"].as_i64().unwrap();

    let outcome = accept_interest(&app.router, &owner, interest_id).await;
    assert_eq!(outcome["interest"]["status"], "accepted");
    assert_eq!(outcome["job"]["status"], "assigned");
    assert_eq!(outcome["job"]["assigned_professional_id"], pro.professional_id);

    let job = body_json(get(&app.router, &format!("/api/v1/jobs/{job_id}")).await).await;
    assert_eq!(job["data"]["status"], "assigned");
    assert_eq!(job["data"]["assigned_professional_id"], pro.professional_id);

    assert!(titles(&notifications(&app.router, &pro).await).contains(&"Interest Accepted!".to_string()));

    // A second decision on the same interest is refused.
    let response = post_json_auth(
        &app.router,
        &format!("/api/v1/interests/{interest_id}/respond"),
        &owner.token,
        json!({ "action": "decline" }),
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "INTEREST_NOT_PENDING").await;
}

// ---------------------------------------------------------------------------
// Test: accepting one applicant declines the others
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accept_declines_remaining_applicants() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let first = professional(&app.router, "nurse_jo").await;
    let second = professional(&app.router, "nurse_kim").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let chosen = express_interest(&app.router, &first, job_id).await;
    let other = express_interest(&app.router, &second, job_id).await;
    accept_interest(&app.router, &owner, chosen["id"].as_i64().unwrap()).await;

    let response = post_json_auth(
        &app.router,
        &format!("/api/v1/interests/{}/respond", other["id"]),
        &owner.token,
        json!({ "action": "accept" }),
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "INTEREST_NOT_PENDING").await;

    let inbox = notifications(&app.router, &second).await;
    assert!(inbox
        .iter()
        .any(|n| n["message"].as_str().unwrap().contains("has been filled")));
}

// ---------------------------------------------------------------------------
// Test: an unknown decision is a validation error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_decision_is_rejected() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();
    let interest = express_interest(&app.router, &pro, job_id).await;

    let response = post_json_auth(
        &app.router,
        &format!("/api/v1/interests/{}/respond", interest["id"]),
        &owner.token,
        json!({ "action": "maybe" }),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST, "VALIDATION_ERROR").await;
}

// ---------------------------------------------------------------------------
// Test: only the owning institution may decide
// ---------------------------------------------------------------------------

#[tokio::test]
async fn other_institution_cannot_respond() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let rival = institution(&app.router, "city_clinic").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();
    let interest = express_interest(&app.router, &pro, job_id).await;

    let response = post_json_auth(
        &app.router,
        &format!("/api/v1/interests/{}/respond", interest["id"]),
        &rival.token,
        json!({ "action": "accept" }),
    )
    .await;
    assert_error(response, StatusCode::FORBIDDEN, "NOT_OWNER").await;
}

// ---------------------------------------------------------------------------
// Test: withdrawing removes the interest; withdrawing again is not found
// ---------------------------------------------------------------------------

#[tokio::test]
async fn withdraw_interest_then_check_is_false() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/cancel-interest"),
        &pro.token,
    )
    .await;
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;

    express_interest(&app.router, &pro, job_id).await;
    let check = body_json(
        get_auth(
            &app.router,
            &format!("/api/v1/jobs/{job_id}/check-interest"),
            &pro.token,
        )
        .await,
    )
    .await;
    assert_eq!(check["data"]["has_interest"], true);

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/cancel-interest"),
        &pro.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let check = body_json(
        get_auth(
            &app.router,
            &format!("/api/v1/jobs/{job_id}/check-interest"),
            &pro.token,
        )
        .await,
    )
    .await;
    assert_eq!(check["data"]["has_interest"], false);

    assert!(titles(&notifications(&app.router, &owner).await).contains(&"Interest Withdrawn".to_string()));
}

// ---------------------------------------------------------------------------
// Test: an assignee withdrawing reopens the gig
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assignee_withdrawal_reopens_job() {
    let app = common::build_test_app();
    let (_owner, pro, job_id) = common::assigned_gig(&app.router).await;

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/cancel-interest"),
        &pro.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let job = body_json(get(&app.router, &format!("/api/v1/jobs/{job_id}")).await).await;
    assert_eq!(job["data"]["status"], "open");
    assert!(job["data"]["assigned_professional_id"].is_null());
}

// ---------------------------------------------------------------------------
// Test: closing twice fails with ALREADY_CLOSED; interest on closed fails
// ---------------------------------------------------------------------------

#[tokio::test]
async fn closing_closed_job_fails() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/v1/jobs/{job_id}/close");
    let response = post_auth(&app.router, &uri, &owner.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "closed");

    let response = post_auth(&app.router, &uri, &owner.token).await;
    assert_error(response, StatusCode::CONFLICT, "ALREADY_CLOSED").await;

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/express-interest"),
        &pro.token,
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "JOB_NOT_OPEN").await;
}

// ---------------------------------------------------------------------------
// Test: closing an assigned gig clears the assignee
// ---------------------------------------------------------------------------

#[tokio::test]
async fn closing_assigned_job_clears_assignee() {
    let app = common::build_test_app();
    let (owner, _pro, job_id) = common::assigned_gig(&app.router).await;

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/close"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "closed");
    assert!(json["data"]["assigned_professional_id"].is_null());
}

// ---------------------------------------------------------------------------
// Test: cancelling an assigned gig tells the professional
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancel_notifies_assignee() {
    let app = common::build_test_app();
    let (owner, pro, job_id) = common::assigned_gig(&app.router).await;

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/cancel"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "cancelled");

    assert!(titles(&notifications(&app.router, &pro).await).contains(&"Gig Cancelled".to_string()));
}

// ---------------------------------------------------------------------------
// Test: completing requires an assignee
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_requires_assignment() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/complete"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let (owner, pro, job_id) = common::assigned_gig(&app.router).await;
    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/complete"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "completed");
    assert_eq!(json["data"]["assigned_professional_id"], pro.professional_id);
}

// ---------------------------------------------------------------------------
// Test: deleting a gig removes its interests and tells every applicant
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_job_notifies_all_applicants() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let first = professional(&app.router, "nurse_jo").await;
    let second = professional(&app.router, "nurse_kim").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();
    express_interest(&app.router, &first, job_id).await;
    express_interest(&app.router, &second, job_id).await;

    let response = delete_auth(&app.router, &format!("/api/v1/jobs/{job_id}"), &owner.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(&app.router, &format!("/api/v1/jobs/{job_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    for pro in [&first, &second] {
        assert!(titles(&notifications(&app.router, pro).await)
            .contains(&"Gig No Longer Available".to_string()));
        let check = body_json(
            get_auth(
                &app.router,
                &format!("/api/v1/jobs/{job_id}/check-interest"),
                &pro.token,
            )
            .await,
        )
        .await;
        assert_eq!(check["data"]["has_interest"], false);
    }
}

// ---------------------------------------------------------------------------
// Test: editing is limited to open gigs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_only_while_open() {
    let app = common::build_test_app();
    let (owner, _pro, job_id) = common::assigned_gig(&app.router).await;

    let response = common::put_json_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}"),
        &owner.token,
        json!({ "title": "Renamed" }),
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "JOB_NOT_OPEN").await;

    let job_id = create_job(&app.router, &owner, "Day shift").await["id"]
        .as_i64()
        .unwrap();
    let response = common::put_json_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}"),
        &owner.token,
        json!({ "title": "Day shift (extended)", "pay_amount": 200000.0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Day shift (extended)");
    assert_eq!(json["data"]["pay_amount"], 200000.0);
}

// ---------------------------------------------------------------------------
// Test: direct assignment without a prior interest
// ---------------------------------------------------------------------------

#[tokio::test]
async fn direct_assignment_notifies_professional() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/assign/{}", pro.professional_id),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "assigned");
    assert_eq!(json["data"]["assigned_professional_id"], pro.professional_id);

    assert!(titles(&notifications(&app.router, &pro).await).contains(&"Gig Assigned".to_string()));

    let assigned = body_json(get_auth(&app.router, "/api/v1/jobs/assigned", &pro.token).await).await;
    assert_eq!(assigned["data"]["assigned"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: public listing shows only open gigs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn public_listing_shows_open_jobs() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let open_id = create_job(&app.router, &owner, "Open shift").await["id"].clone();
    let closed_id = create_job(&app.router, &owner, "Closed shift").await["id"]
        .as_i64()
        .unwrap();
    post_auth(
        &app.router,
        &format!("/api/v1/jobs/{closed_id}/close"),
        &owner.token,
    )
    .await;

    let response = get(&app.router, "/api/v1/jobs").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let ids: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["id"].clone())
        .collect();
    assert_eq!(ids, vec![open_id]);

    let mine = body_json(get_auth(&app.router, "/api/v1/jobs/mine", &owner.token).await).await;
    assert_eq!(mine["data"].as_array().unwrap().len(), 2);
}

async fn respond(
    app: &common::TestApp,
    owner: &common::TestUser,
    interest_id: i64,
    action: &str,
) -> axum::response::Response {
    post_json_auth(
        &app.router,
        &format!("/api/v1/interests/{interest_id}/respond"),
        &owner.token,
        json!({ "action": action }),
    )
    .await
}

/// Interest statuses on a gig keyed by professional id.
async fn interest_statuses(
    app: &common::TestApp,
    owner: &common::TestUser,
    job_id: i64,
) -> std::collections::HashMap<i64, String> {
    let response = get_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/interests"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| {
            (
                entry["interest"]["professional_id"].as_i64().unwrap(),
                entry["interest"]["status"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Test: concurrent decisions on one gig assign it exactly once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_accepts_assign_once() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let first = professional(&app.router, "nurse_jo").await;
    let second = professional(&app.router, "nurse_kim").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();
    let a = express_interest(&app.router, &first, job_id).await["id"].as_i64().unwrap();
    let b = express_interest(&app.router, &second, job_id).await["id"].as_i64().unwrap();

    let (ra, rb) = tokio::join!(
        respond(&app, &owner, a, "accept"),
        respond(&app, &owner, b, "accept"),
    );
    let mut statuses = vec![ra.status(), rb.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);

    let statuses = interest_statuses(&app, &owner, job_id).await;
    let accepted = statuses.values().filter(|s| *s == "accepted").count();
    let declined = statuses.values().filter(|s| *s == "declined").count();
    assert_eq!((accepted, declined), (1, 1));

    let job = body_json(get(&app.router, &format!("/api/v1/jobs/{job_id}")).await).await;
    let assignee = job["data"]["assigned_professional_id"].as_i64().unwrap();
    assert_eq!(statuses[&assignee], "accepted");
}

#[tokio::test]
async fn concurrent_accept_and_decline_of_one_interest() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();
    let interest_id = express_interest(&app.router, &pro, job_id).await["id"]
        .as_i64()
        .unwrap();

    let (accept, decline) = tokio::join!(
        respond(&app, &owner, interest_id, "accept"),
        respond(&app, &owner, interest_id, "decline"),
    );
    let accept_won = accept.status() == StatusCode::OK;
    let loser = if accept_won { decline } else { accept };
    assert_error(loser, StatusCode::CONFLICT, "INTEREST_NOT_PENDING").await;

    let job = body_json(get(&app.router, &format!("/api/v1/jobs/{job_id}")).await).await;
    let expected = if accept_won { "assigned" } else { "open" };
    assert_eq!(job["data"]["status"], expected);
}

// ---------------------------------------------------------------------------
// Test: a withdrawn interest can be expressed again as a fresh row
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reexpress_after_withdrawal_creates_new_interest() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let before = express_interest(&app.router, &pro, job_id).await;
    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/cancel-interest"),
        &pro.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after = express_interest(&app.router, &pro, job_id).await;
    assert_ne!(after["id"], before["id"]);
    assert_eq!(after["status"], "pending");
    assert_eq!(interest_statuses(&app, &owner, job_id).await.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: interest in an assigned gig is refused
// ---------------------------------------------------------------------------

#[tokio::test]
async fn interest_on_assigned_gig_is_not_open() {
    let app = common::build_test_app();
    let (owner, _pro, job_id) = common::assigned_gig(&app.router).await;
    let latecomer = professional(&app.router, "nurse_kim").await;

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/express-interest"),
        &latecomer.token,
    )
    .await;
    assert_error(response, StatusCode::CONFLICT, "JOB_NOT_OPEN").await;
    assert_eq!(interest_statuses(&app, &owner, job_id).await.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: reopening after the assignee withdraws restores filled-out applicants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assignee_withdrawal_restores_auto_declined_applicants() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let chosen = professional(&app.router, "nurse_jo").await;
    let runner_up = professional(&app.router, "nurse_kim").await;
    let rejected = professional(&app.router, "nurse_lee").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();

    let chosen_id = express_interest(&app.router, &chosen, job_id).await["id"].as_i64().unwrap();
    let runner_up_id = express_interest(&app.router, &runner_up, job_id).await["id"]
        .as_i64()
        .unwrap();
    let rejected_id = express_interest(&app.router, &rejected, job_id).await["id"]
        .as_i64()
        .unwrap();

    let response = respond(&app, &owner, rejected_id, "decline").await;
    assert_eq!(response.status(), StatusCode::OK);
    accept_interest(&app.router, &owner, chosen_id).await;
    assert_eq!(
        interest_statuses(&app, &owner, job_id).await[&runner_up.professional_id],
        "declined"
    );

    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/cancel-interest"),
        &chosen.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let statuses = interest_statuses(&app, &owner, job_id).await;
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[&runner_up.professional_id], "pending");
    assert_eq!(statuses[&rejected.professional_id], "declined");
    assert!(titles(&notifications(&app.router, &runner_up).await).contains(&"Gig Reopened".to_string()));
    assert!(!titles(&notifications(&app.router, &rejected).await).contains(&"Gig Reopened".to_string()));

    let outcome = accept_interest(&app.router, &owner, runner_up_id).await;
    assert_eq!(outcome["job"]["assigned_professional_id"], runner_up.professional_id);
}

// ---------------------------------------------------------------------------
// Test: deleting tells a direct assignee once and refuses finished gigs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_notifies_direct_assignee() {
    let app = common::build_test_app();
    let owner = institution(&app.router, "st_marys").await;
    let pro = professional(&app.router, "nurse_jo").await;
    let job_id = create_job(&app.router, &owner, "ICU night shift").await["id"]
        .as_i64()
        .unwrap();
    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/assign/{}", pro.professional_id),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete_auth(&app.router, &format!("/api/v1/jobs/{job_id}"), &owner.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(titles(&notifications(&app.router, &pro).await)
        .contains(&"Gig No Longer Available".to_string()));
}

#[tokio::test]
async fn delete_notifies_accepted_assignee_once() {
    let app = common::build_test_app();
    let (owner, pro, job_id) = common::assigned_gig(&app.router).await;

    let response = delete_auth(&app.router, &format!("/api/v1/jobs/{job_id}"), &owner.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let removed = titles(&notifications(&app.router, &pro).await)
        .into_iter()
        .filter(|t| t == "Gig No Longer Available")
        .count();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn delete_refuses_completed_gig() {
    let app = common::build_test_app();
    let (owner, _pro, job_id) = common::assigned_gig(&app.router).await;
    let response = post_auth(
        &app.router,
        &format!("/api/v1/jobs/{job_id}/complete"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete_auth(&app.router, &format!("/api/v1/jobs/{job_id}"), &owner.token).await;
    assert_error(response, StatusCode::CONFLICT, "JOB_NOT_DELETABLE").await;

    let job = body_json(get(&app.router, &format!("/api/v1/jobs/{job_id}")).await).await;
    assert_eq!(job["data"]["status"], "completed");
}
