//! Translator handlers. Translators are administrative records and are
//! removed outright on delete.

use super::{
    clear_blob, create, fetch, list, parse_id, remove, update, Created, Document, Message,
};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::TRANSLATORS, ListFilter, Store},
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use tracing::instrument;

const REQUIRED: [&str; 5] = [
    "name",
    "designation",
    "englishDescription",
    "urduDescription",
    "image",
];

#[utoipa::path(
    post,
    path = "/api/translators",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Translator created", body = Created),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
    ),
    tag = "translators"
)]
#[instrument(skip(store, payload))]
pub async fn create_translator(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&REQUIRED)?;
    let values = payload.assignments(&TRANSLATORS)?;
    create(&store, &TRANSLATORS, values).await
}

#[utoipa::path(
    get,
    path = "/api/translators",
    responses(
        (status = 200, description = "Translators", body = [Document]),
    ),
    tag = "translators"
)]
#[instrument(skip(store))]
pub async fn list_translators(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let rows = list(&store, &TRANSLATORS, &ListFilter::new()).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/translators/{id}",
    params(("id" = i64, Path, description = "Translator id")),
    responses(
        (status = 200, description = "Translator", body = Document),
        (status = 404, description = "Translator not found", body = ErrorBody),
    ),
    tag = "translators"
)]
#[instrument(skip(store))]
pub async fn get_translator(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &TRANSLATORS, &id).await?)))
}

#[utoipa::path(
    get,
    path = "/api/translators/{id}/image",
    params(("id" = i64, Path, description = "Translator id")),
    responses(
        (status = 200, description = "Translator photo"),
        (status = 404, description = "No photo stored", body = ErrorBody),
    ),
    tag = "translators"
)]
#[instrument(skip(store))]
pub async fn translator_image(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &TRANSLATORS, "image", &id).await
}

#[utoipa::path(
    put,
    path = "/api/translators/{id}",
    params(("id" = i64, Path, description = "Translator id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Translator updated", body = Message),
        (status = 404, description = "Translator not found", body = ErrorBody),
    ),
    tag = "translators"
)]
#[instrument(skip(store, payload))]
pub async fn update_translator(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    let mut values = payload.assignments(&TRANSLATORS)?;
    if payload.flag("removeImage") && payload.file("image").is_none() {
        values.extend(clear_blob(&TRANSLATORS, "image"));
    }
    update(&store, &TRANSLATORS, id, values).await
}

#[utoipa::path(
    delete,
    path = "/api/translators/{id}",
    params(("id" = i64, Path, description = "Translator id")),
    responses(
        (status = 200, description = "Translator deleted", body = Message),
        (status = 404, description = "Translator not found", body = ErrorBody),
    ),
    tag = "translators"
)]
#[instrument(skip(store))]
pub async fn delete_translator(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &TRANSLATORS, &id).await
}
