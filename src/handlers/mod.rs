pub mod dashboard;
pub mod public;

use axum::Router;

use crate::db::AppState;

/// The complete HTTP surface: public routes plus the session-protected dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(public::router(state.clone()))
        .merge(dashboard::router(state.clone()))
        .with_state(state)
}
