pub mod accounts;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod licensing;
pub mod middleware;
pub mod models;
pub mod util;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::AppState;

/// The full application: routes plus request tracing, and permissive CORS in dev.
pub fn app(state: AppState, dev_mode: bool) -> Router {
    let app = handlers::router(state).layer(TraceLayer::new_for_http());
    if dev_mode {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
