use super::{
    clear_blob, create, fetch, list, parse_id, remove, update, Created, Document, Message,
};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::TOPICS, ListFilter, Store},
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/topics",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Topic created", body = Created),
        (status = 400, description = "Topic missing", body = ErrorBody),
    ),
    tag = "topics"
)]
#[instrument(skip(store, payload))]
pub async fn create_topic(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&["topic"])?;
    let values = payload.assignments(&TOPICS)?;
    create(&store, &TOPICS, values).await
}

#[utoipa::path(
    get,
    path = "/api/topics",
    responses(
        (status = 200, description = "Topics", body = [Document]),
    ),
    tag = "topics"
)]
#[instrument(skip(store))]
pub async fn list_topics(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let rows = list(&store, &TOPICS, &ListFilter::new()).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/topics/{id}",
    params(("id" = i64, Path, description = "Topic id")),
    responses(
        (status = 200, description = "Topic", body = Document),
        (status = 404, description = "Topic not found", body = ErrorBody),
    ),
    tag = "topics"
)]
#[instrument(skip(store))]
pub async fn get_topic(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &TOPICS, &id).await?)))
}

#[utoipa::path(
    get,
    path = "/api/topics/{id}/image",
    params(("id" = i64, Path, description = "Topic id")),
    responses(
        (status = 200, description = "Topic image"),
        (status = 404, description = "No image stored", body = ErrorBody),
    ),
    tag = "topics"
)]
#[instrument(skip(store))]
pub async fn topic_image(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &TOPICS, "image", &id).await
}

#[utoipa::path(
    put,
    path = "/api/topics/{id}",
    params(("id" = i64, Path, description = "Topic id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Topic updated", body = Message),
        (status = 404, description = "Topic not found", body = ErrorBody),
    ),
    tag = "topics"
)]
#[instrument(skip(store, payload))]
pub async fn update_topic(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    if payload.contains("topic") && payload.text("topic").is_none() {
        return Err(ApiError::Validation("topic cannot be empty".to_string()));
    }
    let mut values = payload.assignments(&TOPICS)?;
    if payload.flag("removeImage") && payload.file("image").is_none() {
        values.extend(clear_blob(&TOPICS, "image"));
    }
    update(&store, &TOPICS, id, values).await
}

#[utoipa::path(
    delete,
    path = "/api/topics/{id}",
    params(("id" = i64, Path, description = "Topic id")),
    responses(
        (status = 200, description = "Topic deleted", body = Message),
        (status = 404, description = "Topic not found", body = ErrorBody),
    ),
    tag = "topics"
)]
#[instrument(skip(store))]
pub async fn delete_topic(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &TOPICS, &id).await
}
