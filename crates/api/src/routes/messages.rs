//! Route definitions for the `/messages` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::messages;
use crate::state::AppState;

/// Routes mounted at `/messages`.
///
/// ```text
/// POST   /                          -> send
/// GET    /unread-count              -> unread_count
/// GET    /conversations/{user_id}   -> conversation
/// DELETE /{id}                      -> delete
/// POST   /{id}/read                 -> mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(messages::send))
        .route("/unread-count", get(messages::unread_count))
        .route("/conversations/{user_id}", get(messages::conversation))
        .route("/{id}", delete(messages::delete))
        .route("/{id}/read", post(messages::mark_read))
}
