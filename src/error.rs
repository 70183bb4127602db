use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    /// Covers both "does not exist" and "owned by someone else".
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("License already exists for this product, consumer and type")]
    DuplicateLicense,

    #[error("Cannot delete {entity}. There are {count} license(s) associated with this {entity}.")]
    ReferentialConflict { entity: &'static str, count: i64 },

    #[error("License is already full")]
    AlreadyFull,

    #[error("{0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl AppError {
    pub fn missing_fields() -> Self {
        AppError::BadRequest("Missing required fields".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_)
            | AppError::Duplicate(_)
            | AppError::DuplicateLicense
            | AppError::ReferentialConflict { .. }
            | AppError::AlreadyFull => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::Database(_) | AppError::Pool(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, Some(ref msg)) = err
            && failure.code == rusqlite::ErrorCode::ConstraintViolation
            && let Some(mapped) = unique_violation(msg)
        {
            return mapped;
        }
        AppError::Database(err)
    }
}

/// Translate a SQLite "UNIQUE constraint failed: table.col, ..." message into
/// the matching duplicate error.
fn unique_violation(msg: &str) -> Option<AppError> {
    let cols = msg.strip_prefix("UNIQUE constraint failed: ")?;
    let err = if cols.starts_with("licenses.license_type") || cols.starts_with("licenses.license_key") {
        AppError::DuplicateLicense
    } else if cols.starts_with("products.name") {
        AppError::Duplicate("Product already exists".into())
    } else if cols.starts_with("consumers.email") {
        AppError::Duplicate("Email already exists".into())
    } else if cols.starts_with("consumers.account_number") {
        AppError::Duplicate("Account number already exists".into())
    } else if cols.starts_with("users.email") {
        AppError::Duplicate("User already exists".into())
    } else {
        AppError::Duplicate("Duplicate entry".into())
    };
    Some(err)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("Internal error: {}", self);
            "Server error".to_string()
        } else {
            self.to_string()
        };
        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_combination_violation_is_duplicate_license() {
        let err = unique_violation(
            "UNIQUE constraint failed: licenses.license_type, licenses.product_id, licenses.consumer_id, licenses.created_by",
        );
        assert!(matches!(err, Some(AppError::DuplicateLicense)));
    }

    #[test]
    fn consumer_violations_name_the_column() {
        let email = unique_violation("UNIQUE constraint failed: consumers.email, consumers.created_by");
        assert_eq!(email.unwrap().to_string(), "Email already exists");

        let account = unique_violation(
            "UNIQUE constraint failed: consumers.account_number, consumers.created_by",
        );
        assert_eq!(account.unwrap().to_string(), "Account number already exists");
    }

    #[test]
    fn non_unique_constraint_is_not_mapped() {
        assert!(unique_violation("FOREIGN KEY constraint failed").is_none());
    }

    #[test]
    fn referential_conflict_reports_count() {
        let err = AppError::ReferentialConflict { entity: "product", count: 3 };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("There are 3 license(s)"));
    }
}
