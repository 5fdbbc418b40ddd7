use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, DoctorCellState};

pub fn doctor_routes(state: DoctorCellState) -> Router {
    let public_routes = Router::new()
        .route("/{doctor_id}/availability", get(handlers::get_doctor_availability));

    let protected_routes = Router::new()
        .route("/availability", put(handlers::set_my_availability))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
