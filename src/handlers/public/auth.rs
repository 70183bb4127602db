use axum::{extract::State, http::StatusCode};

use crate::accounts;
use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{Credentials, SessionCreated, User};
use crate::util::present;

fn credentials(input: &Credentials) -> Result<(&str, &str)> {
    match (present(&input.email), input.password.as_deref()) {
        (Some(email), Some(password)) if !password.is_empty() => Ok((email, password)),
        _ => Err(AppError::BadRequest("Email and password are required".into())),
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<Credentials>,
) -> Result<(StatusCode, Json<User>)> {
    let (email, password) = credentials(&input)?;
    let user = accounts::register(&state, email, password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<Credentials>,
) -> Result<Json<SessionCreated>> {
    let (email, password) = credentials(&input)?;
    let session = accounts::login(&state, email, password).await?;
    Ok(Json(session))
}
