//! Route definitions for the `/notifications` resource.
//!
//! All endpoints require authentication.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::notifications;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                          -> list_notifications
/// DELETE /                          -> delete_all
/// GET    /unread-count              -> unread_count
/// POST   /read-all                  -> mark_all_read
/// POST   /delete-selected           -> delete_selected
/// DELETE /{id}                      -> delete_notification
/// POST   /{id}/read                 -> mark_read
/// POST   /{id}/respond              -> respond
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(notifications::list_notifications).delete(notifications::delete_all),
        )
        .route("/unread-count", get(notifications::unread_count))
        .route("/read-all", post(notifications::mark_all_read))
        .route("/delete-selected", post(notifications::delete_selected))
        .route("/{id}", delete(notifications::delete_notification))
        .route("/{id}/read", post(notifications::mark_read))
        .route("/{id}/respond", post(notifications::respond))
}
