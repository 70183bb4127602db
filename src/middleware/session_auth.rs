use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::error::AppError;
use crate::models::User;
use crate::util::extract_bearer_token;

/// The signed-in user, attached to the request by [`session_auth`].
#[derive(Clone)]
pub struct UserContext {
    pub user: User,
    /// Raw bearer token of the current session (needed for logout)
    pub token: String,
}

impl UserContext {
    pub fn user_id(&self) -> String {
        self.user.id.clone()
    }
}

/// Resolve `Authorization: Bearer <session token>` to a user.
/// Missing, unknown and expired tokens all yield 401 with no further detail.
pub async fn session_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let lookup = token.clone();
    let user = state
        .run(move |conn| queries::get_user_by_session_token(conn, &lookup))
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(UserContext { user, token });
    Ok(next.run(request).await)
}
