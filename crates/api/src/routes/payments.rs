//! Route definitions for the `/payments` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// POST   /initiate                  -> initiate
/// POST   /webhook                   -> webhook (public, gateway callback)
/// GET    /mine                      -> my_payments
/// GET    /{id}                      -> get_payment
/// POST   /{id}/sync                 -> sync
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initiate", post(payments::initiate))
        .route("/webhook", post(payments::webhook))
        .route("/mine", get(payments::my_payments))
        .route("/{id}", get(payments::get_payment))
        .route("/{id}/sync", post(payments::sync))
}
