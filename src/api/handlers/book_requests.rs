//! Visitors asking for printed copies of books.

use super::{list, valid_email, Document};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::BOOK_REQUESTS, ListFilter, Store},
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

const REQUIRED: [&str; 5] = ["name", "email", "contact", "address", "books"];

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestSubmitted {
    pub message: String,
    pub request_id: i64,
}

#[utoipa::path(
    post,
    path = "/api/requestBook",
    request_body(
        content = Document,
        description = "`{\"name\", \"email\", \"contact\", \"address\", \"books\"}`"
    ),
    responses(
        (status = 201, description = "Request stored", body = RequestSubmitted),
        (status = 400, description = "Missing fields or invalid email", body = ErrorBody),
    ),
    tag = "requestBook"
)]
#[instrument(skip(store, payload))]
pub async fn request_book(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&REQUIRED)?;
    if !payload.text("email").is_some_and(valid_email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }

    let values = payload.assignments(&BOOK_REQUESTS)?;
    let request_id = store
        .insert(&BOOK_REQUESTS, values)
        .await
        .map_err(ApiError::store("store book request"))?;
    info!(request_id, "book request received");

    Ok((
        StatusCode::CREATED,
        Json(RequestSubmitted {
            message: "Book request submitted successfully.".to_string(),
            request_id,
        }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/requestBook",
    responses(
        (status = 200, description = "Book requests, newest first", body = [Document]),
    ),
    tag = "requestBook"
)]
#[instrument(skip(store))]
pub async fn list_book_requests(
    store: Extension<Store>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let rows = list(&store, &BOOK_REQUESTS, &ListFilter::new()).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}
