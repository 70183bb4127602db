use rusqlite::Connection;

use crate::db::{queries, scope::Owned};
use crate::error::{AppError, Result};
use crate::models::{Consumer, IssueLicense, License, LicenseType, Product};
use crate::util::{parse_expiry, present, require_valid_id};

/// Issue a license to one of the caller's consumers for one of the caller's products.
///
/// Checks run in a fixed order and the first failure wins:
/// missing fields, malformed ids, product ownership, consumer ownership,
/// then the per-owner `(type, product, consumer)` combination.
pub fn issue_license(conn: &Connection, owner: Owned, input: &IssueLicense) -> Result<License> {
    let (Some(product_id), Some(consumer_id), Some(license_type)) = (
        present(&input.product_id),
        present(&input.consumer_id),
        present(&input.license_type),
    ) else {
        return Err(AppError::missing_fields());
    };

    let product_id = require_valid_id(product_id, "productId")?;
    let consumer_id = require_valid_id(consumer_id, "consumerId")?;

    let license_type: LicenseType = license_type
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid licenseType. Expected trial or full.".into()))?;
    let expires = parse_expiry(input.expires.as_deref())?;

    owner
        .get::<Product>(conn, product_id)?
        .ok_or_else(|| AppError::NotFound("Product not found or access denied".into()))?;

    owner
        .get::<Consumer>(conn, consumer_id)?
        .ok_or_else(|| AppError::NotFound("Consumer not found or access denied".into()))?;

    if queries::license_combination_exists(conn, owner, license_type, product_id, consumer_id)? {
        return Err(AppError::DuplicateLicense);
    }

    // A concurrent issuer can still win between the check above and this insert;
    // the unique index turns that into DuplicateLicense as well.
    let license =
        queries::create_license(conn, owner, product_id, consumer_id, license_type, expires)?;

    tracing::info!(
        "Issued {} license {} (product: {}, consumer: {}, owner: {})",
        license.license_type.as_ref(),
        license.id,
        product_id,
        consumer_id,
        owner.owner()
    );

    Ok(license)
}
