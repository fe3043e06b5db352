//! Tag handlers: a single `tag` name per record.

use super::{create, fetch, list, parse_id, remove, update, Created, Document, Message};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::TAGS, ListFilter, Store},
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/tags",
    request_body(content = Document, description = "`{\"tag\": \"...\"}`"),
    responses(
        (status = 201, description = "Tag created", body = Created),
        (status = 400, description = "Tag missing", body = ErrorBody),
    ),
    tag = "tags"
)]
#[instrument(skip(store, payload))]
pub async fn create_tag(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&["tag"])?;
    let values = payload.assignments(&TAGS)?;
    create(&store, &TAGS, values).await
}

#[utoipa::path(
    get,
    path = "/api/tags",
    responses(
        (status = 200, description = "Tags", body = [Document]),
    ),
    tag = "tags"
)]
#[instrument(skip(store))]
pub async fn list_tags(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let rows = list(&store, &TAGS, &ListFilter::new()).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag", body = Document),
        (status = 404, description = "Tag not found", body = ErrorBody),
    ),
    tag = "tags"
)]
#[instrument(skip(store))]
pub async fn get_tag(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &TAGS, &id).await?)))
}

#[utoipa::path(
    put,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag id")),
    request_body(content = Document, description = "`{\"tag\": \"...\"}`"),
    responses(
        (status = 200, description = "Tag renamed", body = Message),
        (status = 400, description = "Tag missing", body = ErrorBody),
        (status = 404, description = "Tag not found", body = ErrorBody),
    ),
    tag = "tags"
)]
#[instrument(skip(store, payload))]
pub async fn update_tag(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    payload.require(&["tag"])?;
    let values = payload.assignments(&TAGS)?;
    update(&store, &TAGS, id, values).await
}

#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag deleted", body = Message),
        (status = 404, description = "Tag not found", body = ErrorBody),
    ),
    tag = "tags"
)]
#[instrument(skip(store))]
pub async fn delete_tag(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &TAGS, &id).await
}
