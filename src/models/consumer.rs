use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    /// Identifier the license holder's software reports at verification time
    pub account_number: String,
    pub created_by: String,
    #[serde(serialize_with = "crate::util::ts_millis::serialize")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsumer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub account_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerLookup {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
}

/// Consumer fields after presence checks, ready to insert.
#[derive(Debug, Clone)]
pub struct NewConsumer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub account_number: String,
}
