//! Route definitions for `/admin`. Every handler requires the admin role.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST   /users/{id}/roles          -> assign_role
/// GET    /documents/pending         -> pending_documents
/// POST   /documents/{id}/review     -> review_document
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/roles", post(admin::assign_role))
        .route("/documents/pending", get(admin::pending_documents))
        .route("/documents/{id}/review", post(admin::review_document))
}
