use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::{ConsumerSummary, ProductSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LicenseType {
    Trial,
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub id: String,
    pub license_key: String,
    pub product_id: String,
    pub consumer_id: String,
    pub license_type: LicenseType,
    /// None = never expires
    #[serde(serialize_with = "crate::util::ts_millis::option")]
    pub expires: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_by: String,
    #[serde(serialize_with = "crate::util::ts_millis::serialize")]
    pub created_at: DateTime<Utc>,
}

impl License {
    /// Expired means `expires` lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|exp| exp < now)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseWithDetails {
    #[serde(flatten)]
    pub license: License,
    pub product: ProductSummary,
    pub consumer: ConsumerSummary,
}

/// Issuance request body. Everything is optional at the serde level so that
/// absent fields surface as "Missing required fields" rather than a parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLicense {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub consumer_id: Option<String>,
    #[serde(default)]
    pub license_type: Option<String>,
    /// ISO timestamp; absent or null for a perpetual license
    #[serde(default)]
    pub expires: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseIdBody {
    #[serde(default)]
    pub license_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeLicense {
    #[serde(default)]
    pub license_id: Option<String>,
    #[serde(default)]
    pub license_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLicense {
    #[serde(default)]
    pub license_id: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLicenseExpiry {
    #[serde(default)]
    pub license_id: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
}

/// A license as shown in a consumer lookup: the consumer is implied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerLicense {
    pub id: String,
    pub license_key: String,
    pub product: ProductSummary,
    pub license_type: LicenseType,
    #[serde(serialize_with = "crate::util::ts_millis::option")]
    pub expires: Option<DateTime<Utc>>,
    pub active: bool,
    #[serde(serialize_with = "crate::util::ts_millis::serialize")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckLicenseRequest {
    #[serde(default)]
    pub license_key: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Valid,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckLicenseResponse {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
