pub mod admin;
pub mod auth;
pub mod documents;
pub mod health;
pub mod interests;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod payments;
pub mod ratings;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  WebSocket (token via ?token= or headers)
///
/// /auth/register                       register (public)
/// /auth/login                          login (public)
/// /auth/logout                         logout
/// /auth/me                             identity, roles, active role
/// /auth/switch-role                    change active role
///
/// /admin/users/{id}/roles              grant role (admin)
/// /admin/documents/pending             review queue (admin)
/// /admin/documents/{id}/review         approve / reject (admin)
///
/// /jobs                                list open (public), create (institution)
/// /jobs/mine                           institution's postings
/// /jobs/assigned                       professional's work
/// /jobs/{id}                           get (public), update, delete
/// /jobs/{id}/express-interest          professional
/// /jobs/{id}/cancel-interest           professional
/// /jobs/{id}/check-interest            professional
/// /jobs/{id}/interests                 institution
/// /jobs/{id}/close|cancel|complete     institution
/// /jobs/{id}/assign/{professional_id}  institution
///
/// /interests/{id}/respond              accept / decline (institution)
///
/// /notifications                       list, delete all
/// /notifications/unread-count          count
/// /notifications/read-all              mark all read
/// /notifications/delete-selected       bulk delete
/// /notifications/{id}                  delete
/// /notifications/{id}/read             mark read
/// /notifications/{id}/respond          decide on the linked interest
///
/// /payments/initiate                   institution
/// /payments/webhook                    gateway callback (public)
/// /payments/mine                       caller's payments
/// /payments/{id}                       status
/// /payments/{id}/sync                  re-query the gateway
///
/// /ratings                             submit
/// /ratings/users/{id}                  ratings received
///
/// /messages                            send
/// /messages/unread-count               count
/// /messages/conversations/{user_id}    thread
/// /messages/{id}                       hide
/// /messages/{id}/read                  mark read
///
/// /documents                           register metadata
/// /documents/mine                      caller's documents
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/jobs", jobs::router())
        .nest("/interests", interests::router())
        .nest("/notifications", notifications::router())
        .nest("/payments", payments::router())
        .nest("/ratings", ratings::router())
        .nest("/messages", messages::router())
        .nest("/documents", documents::router())
}
