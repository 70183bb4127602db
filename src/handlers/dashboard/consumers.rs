use axum::{
    extract::{Extension, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::db::{AppState, queries, scope::Owned};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::licensing;
use crate::middleware::UserContext;
use crate::models::{Consumer, ConsumerLicense, ConsumerLookup, CreateConsumer, NewConsumer};
use crate::util::{is_valid_id, present};

#[derive(Serialize)]
pub struct ConsumerWithLicenses {
    pub consumer: Consumer,
    pub licenses: Vec<ConsumerLicense>,
}

pub async fn list_consumers(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<Consumer>>> {
    let owner_id = ctx.user_id();
    let consumers = state
        .run(move |conn| queries::list_consumers(conn, Owned::by(&owner_id)))
        .await?;
    Ok(Json(consumers))
}

pub async fn create_consumer(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CreateConsumer>,
) -> Result<(StatusCode, Json<Consumer>)> {
    let (Some(name), Some(email), Some(account_number)) = (
        present(&input.name),
        present(&input.email),
        present(&input.account_number),
    ) else {
        return Err(AppError::BadRequest(
            "Name, email and account number are required".into(),
        ));
    };

    let new = NewConsumer {
        name: name.to_string(),
        email: email.to_string(),
        phone: present(&input.phone).map(String::from),
        country: present(&input.country).map(String::from),
        account_number: account_number.to_string(),
    };

    let owner_id = ctx.user_id();
    let consumer = state
        .run(move |conn| queries::create_consumer(conn, Owned::by(&owner_id), &new))
        .await?;

    tracing::info!(
        "Created consumer {} (account {}) for user {}",
        consumer.id,
        consumer.account_number,
        consumer.created_by
    );

    Ok((StatusCode::CREATED, Json(consumer)))
}

pub async fn get_consumer(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Consumer>> {
    if !is_valid_id(&id) {
        return Err(AppError::BadRequest("Invalid consumer ID".into()));
    }

    let owner_id = ctx.user_id();
    let consumer = state
        .run(move |conn| Owned::by(&owner_id).get::<Consumer>(conn, &id))
        .await?
        .ok_or_else(|| AppError::NotFound("Consumer not found".into()))?;

    Ok(Json(consumer))
}

pub async fn delete_consumer(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let owner_id = ctx.user_id();
    let consumer = state
        .run(move |conn| licensing::delete_consumer(conn, Owned::by(&owner_id), &id))
        .await?;

    Ok(Json(json!({
        "message": "Consumer deleted",
        "id": consumer.id,
    })))
}

/// Find one of the caller's consumers by email and/or account number,
/// together with the licenses issued to it.
pub async fn lookup_consumer(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<ConsumerLookup>,
) -> Result<Json<ConsumerWithLicenses>> {
    let email = present(&input.email).map(String::from);
    let account_number = present(&input.account_number).map(String::from);
    if email.is_none() && account_number.is_none() {
        return Err(AppError::BadRequest(
            "Either email or account number is required".into(),
        ));
    }

    let owner_id = ctx.user_id();
    let found = state
        .run(move |conn| {
            let owner = Owned::by(&owner_id);
            let Some(consumer) =
                queries::find_consumer(conn, owner, email.as_deref(), account_number.as_deref())?
            else {
                return Ok(None);
            };
            let licenses = queries::list_licenses_for_consumer(conn, owner, &consumer.id)?;
            Ok(Some(ConsumerWithLicenses { consumer, licenses }))
        })
        .await?
        .ok_or_else(|| AppError::NotFound("Consumer not found".into()))?;

    Ok(Json(found))
}
