use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::{CheckLicenseRequest, CheckLicenseResponse, CheckStatus};
use crate::util::{format_timestamp, present};

/// Why a verification request was judged invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Unknown account, or no license with this key for the account and product.
    /// Both read the same so integrators cannot probe for account numbers.
    NotFound,
    InvalidProduct,
    Deactivated,
    Expired,
}

impl InvalidReason {
    pub fn message(&self) -> &'static str {
        match self {
            InvalidReason::NotFound => "License not found",
            InvalidReason::InvalidProduct => "Invalid product",
            InvalidReason::Deactivated => "License deactivated",
            InvalidReason::Expired => "License expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid {
        product: String,
        expires: Option<DateTime<Utc>>,
    },
    Invalid(InvalidReason),
}

impl From<Verdict> for CheckLicenseResponse {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Valid { product, expires } => CheckLicenseResponse {
                status: CheckStatus::Valid,
                product: Some(product),
                expires: expires.as_ref().map(format_timestamp),
                active: Some(true),
                error: None,
            },
            Verdict::Invalid(reason) => CheckLicenseResponse {
                status: CheckStatus::Invalid,
                product: None,
                expires: None,
                active: None,
                error: Some(reason.message().to_string()),
            },
        }
    }
}

/// A blank value counts as missing; a present one is matched exactly as sent.
fn required(value: &Option<String>) -> Option<&str> {
    present(value).and(value.as_deref())
}

/// Classify a `(licenseKey, productName, accountNumber)` triple.
///
/// Identity checks come before state checks: account, product, then the exact
/// key for that account and product. Only a resolved license can report
/// "deactivated" or "expired". Read-only, so repeated calls against the same
/// data return the same verdict.
pub fn verify_license(
    conn: &Connection,
    request: &CheckLicenseRequest,
    now: DateTime<Utc>,
) -> Result<Verdict> {
    let (Some(license_key), Some(product_name), Some(account_number)) = (
        required(&request.license_key),
        required(&request.product_name),
        required(&request.account_number),
    ) else {
        return Err(AppError::missing_fields());
    };

    if !queries::account_number_exists(conn, account_number)? {
        tracing::debug!("Verification: no consumer for account {}", account_number);
        return Ok(Verdict::Invalid(InvalidReason::NotFound));
    }

    if !queries::product_name_exists(conn, product_name)? {
        tracing::debug!("Verification: no product named {}", product_name);
        return Ok(Verdict::Invalid(InvalidReason::InvalidProduct));
    }

    let Some(license) =
        queries::find_license_for_verification(conn, license_key, account_number, product_name)?
    else {
        tracing::debug!(
            "Verification: key does not match account {} and product {}",
            account_number,
            product_name
        );
        return Ok(Verdict::Invalid(InvalidReason::NotFound));
    };

    if !license.active {
        return Ok(Verdict::Invalid(InvalidReason::Deactivated));
    }

    if license.is_expired_at(now) {
        return Ok(Verdict::Invalid(InvalidReason::Expired));
    }

    Ok(Verdict::Valid {
        product: product_name.to_string(),
        expires: license.expires,
    })
}
