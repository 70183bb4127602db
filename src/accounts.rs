//! Credential accounts and login sessions.
//!
//! bcrypt is deliberately slow, so hashing and verification run on the
//! blocking pool rather than on an async worker.

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::{SessionCreated, User};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_owned();
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Register a credential account. Email is unique across all users.
pub async fn register(state: &AppState, email: &str, password: &str) -> Result<User> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }

    let password_hash = hash_password(password).await?;
    let user = state
        .run(move |conn| queries::create_user(conn, &email, Some(&password_hash)))
        .await?;

    tracing::info!("Registered user {} ({})", user.email, user.id);
    Ok(user)
}

/// Check credentials and open a session.
///
/// Unknown emails, wrong passwords and password-less (federated) accounts
/// all fail the same way.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<SessionCreated> {
    let email = normalize_email(email);
    let user = state
        .run(move |conn| queries::get_user_by_email(conn, &email))
        .await?
        .ok_or(AppError::Unauthorized)?;

    let Some(hash) = user.password_hash.as_deref() else {
        return Err(AppError::Unauthorized);
    };
    if !verify_password(password, hash).await? {
        return Err(AppError::Unauthorized);
    }

    let user_id = user.id.clone();
    let ttl_hours = state.session_ttl_hours;
    let (session, token) = state
        .run(move |conn| queries::create_session(conn, &user_id, ttl_hours))
        .await?;

    tracing::info!("User {} signed in (session {})", user.id, session.id);

    Ok(SessionCreated {
        token,
        expires_at: session.expires_at,
        user,
    })
}

pub async fn logout(state: &AppState, token: &str) -> Result<()> {
    let token = token.to_owned();
    state
        .run(move |conn| queries::delete_session_by_token(conn, &token))
        .await?;
    Ok(())
}
