use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::db::scope::{Owned, OwnedTable};
use crate::error::{AppError, Result};
use crate::models::{
    Consumer, License, LicenseType, Product, SetLicenseExpiry, ToggleLicense, UpgradeLicense,
};
use crate::util::{is_valid_id, parse_expiry, present};

fn license_id(raw: &Option<String>) -> Result<&str> {
    present(raw)
        .filter(|id| is_valid_id(id))
        .ok_or_else(|| AppError::BadRequest("Invalid licenseId".into()))
}

fn owned_license(conn: &Connection, owner: Owned, id: &str) -> Result<License> {
    owner
        .get::<License>(conn, id)?
        .ok_or_else(|| AppError::NotFound("License not found or access denied".into()))
}

/// Set `active` on one of the caller's licenses. No other field changes.
pub fn toggle_license(conn: &Connection, owner: Owned, input: &ToggleLicense) -> Result<License> {
    let (Some(_), Some(active)) = (present(&input.license_id), input.active) else {
        return Err(AppError::BadRequest("Missing or invalid fields".into()));
    };
    let id = license_id(&input.license_id)?;

    owned_license(conn, owner, id)?;
    owner.set::<License>(conn, id, "active", &active)?;

    tracing::info!(
        "License {} {} (owner: {})",
        id,
        if active { "activated" } else { "deactivated" },
        owner.owner()
    );

    owned_license(conn, owner, id)
}

/// Upgrade one of the caller's licenses from trial to full. One-way only.
pub fn upgrade_license(conn: &Connection, owner: Owned, input: &UpgradeLicense) -> Result<License> {
    let id = license_id(&input.license_id)?;

    if present(&input.license_type) != Some(LicenseType::Full.as_ref()) {
        return Err(AppError::BadRequest(
            "Invalid licenseType. Only upgrade to full is allowed.".into(),
        ));
    }

    let license = owned_license(conn, owner, id)?;
    if license.license_type == LicenseType::Full {
        return Err(AppError::AlreadyFull);
    }

    owner.set::<License>(conn, id, "license_type", &LicenseType::Full.as_ref())?;

    tracing::info!("License {} upgraded to full (owner: {})", id, owner.owner());

    owned_license(conn, owner, id)
}

/// Replace the expiry of one of the caller's licenses; null clears it.
pub fn set_license_expiry(
    conn: &Connection,
    owner: Owned,
    input: &SetLicenseExpiry,
) -> Result<License> {
    let id = license_id(&input.license_id)?;
    let expires = parse_expiry(input.expires.as_deref())?;

    owned_license(conn, owner, id)?;
    owner.set::<License>(conn, id, "expires", &expires.map(|e| e.timestamp_millis()))?;

    tracing::info!(
        "License {} expiry set to {:?} (owner: {})",
        id,
        expires,
        owner.owner()
    );

    owned_license(conn, owner, id)
}

pub fn delete_license(conn: &Connection, owner: Owned, raw_id: &Option<String>) -> Result<()> {
    let id = license_id(raw_id)?;
    if !owner.delete::<License>(conn, id)? {
        return Err(AppError::NotFound("License not found or access denied".into()));
    }
    tracing::info!("License {} deleted (owner: {})", id, owner.owner());
    Ok(())
}

/// Delete one of the caller's products, refused while any of the caller's
/// licenses still reference it.
pub fn delete_product(conn: &Connection, owner: Owned, id: &str) -> Result<Product> {
    delete_guarded::<Product>(conn, owner, id, "product", "product_id")
}

/// Delete one of the caller's consumers, refused while any of the caller's
/// licenses still reference it.
pub fn delete_consumer(conn: &Connection, owner: Owned, id: &str) -> Result<Consumer> {
    delete_guarded::<Consumer>(conn, owner, id, "consumer", "consumer_id")
}

/// Count dependents and delete inside one IMMEDIATE transaction, so a license
/// issued concurrently cannot land between the check and the delete.
fn delete_guarded<T: OwnedTable>(
    conn: &Connection,
    owner: Owned,
    id: &str,
    entity: &'static str,
    license_column: &'static str,
) -> Result<T> {
    let not_found = || {
        AppError::NotFound(match entity {
            "product" => "Product not found".into(),
            "consumer" => "Consumer not found".into(),
            other => format!("{} not found", other),
        })
    };

    if !is_valid_id(id) {
        return Err(AppError::BadRequest(format!("Invalid {} ID", entity)));
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let existing = owner.get::<T>(&tx, id)?.ok_or_else(not_found)?;

    let count = owner.count_where::<License>(&tx, license_column, id)?;
    if count > 0 {
        return Err(AppError::ReferentialConflict { entity, count });
    }

    if !owner.delete::<T>(&tx, id)? {
        return Err(not_found());
    }
    tx.commit()?;

    tracing::info!("Deleted {} {} (owner: {})", entity, id, owner.owner());

    Ok(existing)
}
