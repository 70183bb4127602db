use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::db::{AppState, queries, scope::Owned};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::licensing;
use crate::middleware::UserContext;
use crate::models::{CreateProduct, Product};
use crate::util::present;

pub async fn list_products(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<Product>>> {
    let owner_id = ctx.user_id();
    let products = state
        .run(move |conn| queries::list_products(conn, Owned::by(&owner_id)))
        .await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let name = present(&input.name)
        .ok_or_else(|| AppError::BadRequest("Name is required".into()))?
        .to_string();
    let description = present(&input.description).map(String::from);

    let owner_id = ctx.user_id();
    let product = state
        .run(move |conn| {
            queries::create_product(conn, Owned::by(&owner_id), &name, description.as_deref())
        })
        .await?;

    tracing::info!(
        "Created product {} ({}) for user {}",
        product.name,
        product.id,
        product.created_by
    );

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let owner_id = ctx.user_id();
    let product = state
        .run(move |conn| licensing::delete_product(conn, Owned::by(&owner_id), &id))
        .await?;

    Ok(Json(json!({
        "message": "Product deleted",
        "id": product.id,
    })))
}
