use axum::extract::{Extension, State};
use serde_json::{Value, json};

use crate::accounts;
use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::UserContext;

pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Value>> {
    accounts::logout(&state, &ctx.token).await?;
    tracing::info!("User {} signed out", ctx.user.id);
    Ok(Json(json!({ "message": "Signed out" })))
}

pub async fn current_session(Extension(ctx): Extension<UserContext>) -> Json<Value> {
    Json(json!({
        "user": {
            "id": ctx.user.id,
            "email": ctx.user.email,
            "role": ctx.user.role,
        }
    }))
}
