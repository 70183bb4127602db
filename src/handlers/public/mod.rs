mod auth;
mod check_license;

pub use auth::*;
pub use check_license::*;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde::Serialize;

use crate::db::AppState;
use crate::middleware::require_api_secret;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router<AppState> {
    // Integrator-facing; gated by the shared secret instead of a session
    let integrator_routes = Router::new()
        .route("/check-license", post(check_license))
        .layer(middleware::from_fn_with_state(state, require_api_secret));

    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(integrator_routes)
}
