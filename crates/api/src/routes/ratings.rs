use axum::routing::{get, post};
use axum::Router;

use crate::handlers::ratings;
use crate::state::AppState;

/// Routes mounted at `/ratings`.
///
/// ```text
/// POST   /                          -> submit
/// GET    /users/{id}                -> user_ratings
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(ratings::submit))
        .route("/users/{id}", get(ratings::user_ratings))
}
