use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// bcrypt hash; absent for accounts created through federated sign-in
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: String,
    #[serde(serialize_with = "crate::util::ts_millis::serialize")]
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_ROLE: &str = "admin";

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Returned once at login; the raw token is never stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub token: String,
    #[serde(serialize_with = "crate::util::ts_millis::serialize")]
    pub expires_at: DateTime<Utc>,
    pub user: User,
}
