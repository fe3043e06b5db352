//! "About us" sections: bilingual title and description with an image.

use super::{
    clear_blob, create, fetch, list, parse_id, remove, update, Created, Document, Message,
};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::ABOUT, ListFilter, Record, Store},
    text::plain_text,
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use serde_json::Value;
use tracing::instrument;

const REQUIRED: [&str; 5] = [
    "englishTitle",
    "urduTitle",
    "englishDescription",
    "urduDescription",
    "image",
];

/// Reads return descriptions as plain text.
fn with_plain_descriptions(mut row: Record) -> Record {
    for key in ["englishDescription", "urduDescription"] {
        if let Some(Value::String(description)) = row.get_mut(key) {
            *description = plain_text(description);
        }
    }
    row
}

#[utoipa::path(
    post,
    path = "/api/about",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "About content created", body = Created),
        (status = 400, description = "Missing fields", body = ErrorBody),
    ),
    tag = "about"
)]
#[instrument(skip(store, payload))]
pub async fn create_about(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&REQUIRED)?;
    let values = payload.assignments(&ABOUT)?;
    create(&store, &ABOUT, values).await
}

#[utoipa::path(
    get,
    path = "/api/about",
    responses(
        (status = 200, description = "About sections with plain-text descriptions", body = [Document]),
    ),
    tag = "about"
)]
#[instrument(skip(store))]
pub async fn list_about(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let rows = list(&store, &ABOUT, &ListFilter::new()).await?;
    Ok(Json(
        rows.into_iter()
            .map(with_plain_descriptions)
            .map(Document)
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/about/{id}",
    params(("id" = i64, Path, description = "About content id")),
    responses(
        (status = 200, description = "About section", body = Document),
        (status = 404, description = "About content not found", body = ErrorBody),
    ),
    tag = "about"
)]
#[instrument(skip(store))]
pub async fn get_about(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let row = fetch(&store, &ABOUT, &id).await?;
    Ok(Json(Document(with_plain_descriptions(row))))
}

#[utoipa::path(
    get,
    path = "/api/about/{id}/image",
    params(("id" = i64, Path, description = "About content id")),
    responses(
        (status = 200, description = "Section image"),
        (status = 404, description = "No image stored", body = ErrorBody),
    ),
    tag = "about"
)]
#[instrument(skip(store))]
pub async fn about_image(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &ABOUT, "image", &id).await
}

/// Only the fields sent are changed; descriptions are stored as sent.
#[utoipa::path(
    put,
    path = "/api/about/{id}",
    params(("id" = i64, Path, description = "About content id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "About content updated", body = Message),
        (status = 404, description = "About content not found", body = ErrorBody),
    ),
    tag = "about"
)]
#[instrument(skip(store, payload))]
pub async fn update_about(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    let mut values = payload.assignments(&ABOUT)?;
    if payload.flag("removeImage") && payload.file("image").is_none() {
        values.extend(clear_blob(&ABOUT, "image"));
    }
    update(&store, &ABOUT, id, values).await
}

#[utoipa::path(
    delete,
    path = "/api/about/{id}",
    params(("id" = i64, Path, description = "About content id")),
    responses(
        (status = 200, description = "About content deleted", body = Message),
        (status = 404, description = "About content not found", body = ErrorBody),
    ),
    tag = "about"
)]
#[instrument(skip(store))]
pub async fn delete_about(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &ABOUT, &id).await
}
