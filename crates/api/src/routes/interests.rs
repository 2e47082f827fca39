use axum::routing::post;
use axum::Router;

use crate::handlers::interests;
use crate::state::AppState;

/// Routes mounted at `/interests`.
///
/// ```text
/// POST   /{id}/respond              -> respond
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/respond", post(interests::respond))
}
