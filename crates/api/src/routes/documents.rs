use axum::routing::{get, post};
use axum::Router;

use crate::handlers::documents;
use crate::state::AppState;

/// Routes mounted at `/documents`.
///
/// ```text
/// POST   /                          -> register
/// GET    /mine                      -> my_documents
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(documents::register))
        .route("/mine", get(documents::my_documents))
}
