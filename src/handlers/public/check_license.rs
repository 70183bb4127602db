use axum::extract::State;
use chrono::Utc;

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::licensing::{Verdict, verify_license};
use crate::models::{CheckLicenseRequest, CheckLicenseResponse};

/// Verify a license for an external integrator.
///
/// Business outcomes are always 200 with a `status` field; only a bad
/// secret (401), a malformed body (400) or a server failure change the code.
pub async fn check_license(
    State(state): State<AppState>,
    Json(request): Json<CheckLicenseRequest>,
) -> Result<Json<CheckLicenseResponse>> {
    let product_name = request.product_name.clone();
    let verdict = state
        .run(move |conn| verify_license(conn, &request, Utc::now()))
        .await?;

    match &verdict {
        Verdict::Valid { .. } => {
            tracing::debug!("License check for {:?}: valid", product_name);
        }
        Verdict::Invalid(reason) => {
            tracing::debug!(
                "License check for {:?}: invalid ({})",
                product_name,
                reason.message()
            );
        }
    }

    Ok(Json(verdict.into()))
}
