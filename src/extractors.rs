//! Wrappers around axum's extractors that reject with `AppError`, so clients
//! always get the `{ "error": ... }` body.

use axum::{
    extract::{FromRequest, FromRequestParts, rejection::{JsonRejection, PathRejection}},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(_) => AppError::BadRequest("Invalid JSON format".into()),
            JsonRejection::JsonDataError(_) => {
                AppError::BadRequest("Missing or invalid fields".into())
            }
            JsonRejection::MissingJsonContentType(_) => {
                AppError::BadRequest("Expected request with `Content-Type: application/json`".into())
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
