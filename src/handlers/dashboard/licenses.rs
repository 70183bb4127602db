use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::db::{AppState, queries, scope::Owned};
use crate::error::Result;
use crate::extractors::Json;
use crate::licensing;
use crate::middleware::UserContext;
use crate::models::{
    IssueLicense, License, LicenseIdBody, LicenseWithDetails, SetLicenseExpiry, ToggleLicense,
    UpgradeLicense,
};

pub async fn list_licenses(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<LicenseWithDetails>>> {
    let owner_id = ctx.user_id();
    let licenses = state
        .run(move |conn| queries::list_licenses_with_details(conn, Owned::by(&owner_id)))
        .await?;
    Ok(Json(licenses))
}

pub async fn issue_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<IssueLicense>,
) -> Result<(StatusCode, Json<License>)> {
    let owner_id = ctx.user_id();
    let license = state
        .run(move |conn| licensing::issue_license(conn, Owned::by(&owner_id), &input))
        .await?;
    Ok((StatusCode::CREATED, Json(license)))
}

pub async fn delete_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<LicenseIdBody>,
) -> Result<Json<Value>> {
    let owner_id = ctx.user_id();
    state
        .run(move |conn| licensing::delete_license(conn, Owned::by(&owner_id), &input.license_id))
        .await?;
    Ok(Json(json!({ "message": "License deleted" })))
}

pub async fn upgrade_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<UpgradeLicense>,
) -> Result<Json<License>> {
    let owner_id = ctx.user_id();
    let license = state
        .run(move |conn| licensing::upgrade_license(conn, Owned::by(&owner_id), &input))
        .await?;
    Ok(Json(license))
}

pub async fn toggle_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<ToggleLicense>,
) -> Result<Json<License>> {
    let owner_id = ctx.user_id();
    let license = state
        .run(move |conn| licensing::toggle_license(conn, Owned::by(&owner_id), &input))
        .await?;
    Ok(Json(license))
}

pub async fn set_license_expiry(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<SetLicenseExpiry>,
) -> Result<Json<License>> {
    let owner_id = ctx.user_id();
    let license = state
        .run(move |conn| licensing::set_license_expiry(conn, Owned::by(&owner_id), &input))
        .await?;
    Ok(Json(license))
}
