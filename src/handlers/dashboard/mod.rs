mod consumers;
mod licenses;
mod products;
mod session;

pub use consumers::*;
pub use licenses::*;
pub use products::*;
pub use session::*;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::db::AppState;
use crate::middleware::session_auth;

/// Routes for a signed-in user. Everything here is owner-scoped.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
        // Products
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", delete(delete_product))
        // Consumers
        .route("/consumers", get(list_consumers).post(create_consumer))
        .route("/consumers/lookup", post(lookup_consumer))
        .route("/consumers/{id}", get(get_consumer).delete(delete_consumer))
        // Licenses
        .route(
            "/licenses",
            get(list_licenses)
                .post(issue_license)
                .put(upgrade_license)
                .delete(delete_license),
        )
        .route("/licenses/toggle", post(toggle_license))
        .route("/licenses/expiry", post(set_license_expiry))
        .layer(middleware::from_fn_with_state(state, session_auth))
}
