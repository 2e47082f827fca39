//! Route definitions for the `/jobs` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// GET    /                                  -> list_jobs (public)
/// POST   /                                  -> create_job
/// GET    /mine                              -> my_jobs
/// GET    /assigned                          -> assigned_jobs
/// GET    /{id}                              -> get_job (public)
/// PUT    /{id}                              -> update_job
/// DELETE /{id}                              -> delete_job
/// POST   /{id}/express-interest             -> express_interest
/// POST   /{id}/cancel-interest              -> cancel_interest
/// GET    /{id}/check-interest               -> check_interest
/// GET    /{id}/interests                    -> list_interests
/// POST   /{id}/close                        -> close_job
/// POST   /{id}/cancel                       -> cancel_job
/// POST   /{id}/complete                     -> complete_job
/// POST   /{id}/assign/{professional_id}     -> assign_job
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::create_job))
        .route("/mine", get(jobs::my_jobs))
        .route("/assigned", get(jobs::assigned_jobs))
        .route(
            "/{id}",
            get(jobs::get_job)
                .put(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/{id}/express-interest", post(jobs::express_interest))
        .route("/{id}/cancel-interest", post(jobs::cancel_interest))
        .route("/{id}/check-interest", get(jobs::check_interest))
        .route("/{id}/interests", get(jobs::list_interests))
        .route("/{id}/close", post(jobs::close_job))
        .route("/{id}/cancel", post(jobs::cancel_job))
        .route("/{id}/complete", post(jobs::complete_job))
        .route("/{id}/assign/{professional_id}", post(jobs::assign_job))
}
