use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::db::AppState;
use crate::error::AppError;

pub const API_SECRET_HEADER: &str = "x-api-secret";

/// Exact, constant-time match of `x-api-secret` against the configured secret.
/// Runs before the body is read, so a bad secret never reaches JSON parsing.
pub async fn require_api_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get(API_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    let authorized = match (provided, state.api_secret.as_deref()) {
        (Some(provided), Some(expected)) => {
            bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
        }
        _ => false,
    };

    if !authorized {
        tracing::warn!("Rejected license check: missing or wrong API secret");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
