use super::{create, fetch, list, parse_id, remove, update, Created, Document, Message};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::LANGUAGES, ListFilter, Store},
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/languages",
    request_body(content = Document, description = "`{\"language\": \"...\"}`"),
    responses(
        (status = 201, description = "Language created", body = Created),
        (status = 400, description = "Language missing", body = ErrorBody),
    ),
    tag = "languages"
)]
#[instrument(skip(store, payload))]
pub async fn create_language(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&["language"])?;
    let values = payload.assignments(&LANGUAGES)?;
    create(&store, &LANGUAGES, values).await
}

#[utoipa::path(
    get,
    path = "/api/languages",
    responses(
        (status = 200, description = "Languages", body = [Document]),
    ),
    tag = "languages"
)]
#[instrument(skip(store))]
pub async fn list_languages(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let rows = list(&store, &LANGUAGES, &ListFilter::new()).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/languages/{id}",
    params(("id" = i64, Path, description = "Language id")),
    responses(
        (status = 200, description = "Language", body = Document),
        (status = 404, description = "Language not found", body = ErrorBody),
    ),
    tag = "languages"
)]
#[instrument(skip(store))]
pub async fn get_language(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &LANGUAGES, &id).await?)))
}

#[utoipa::path(
    put,
    path = "/api/languages/{id}",
    params(("id" = i64, Path, description = "Language id")),
    request_body(content = Document, description = "`{\"language\": \"...\"}`"),
    responses(
        (status = 200, description = "Language renamed", body = Message),
        (status = 400, description = "Language missing", body = ErrorBody),
        (status = 404, description = "Language not found", body = ErrorBody),
    ),
    tag = "languages"
)]
#[instrument(skip(store, payload))]
pub async fn update_language(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    payload.require(&["language"])?;
    let values = payload.assignments(&LANGUAGES)?;
    update(&store, &LANGUAGES, id, values).await
}

/// Languages are removed outright.
#[utoipa::path(
    delete,
    path = "/api/languages/{id}",
    params(("id" = i64, Path, description = "Language id")),
    responses(
        (status = 200, description = "Language deleted", body = Message),
        (status = 404, description = "Language not found", body = ErrorBody),
    ),
    tag = "languages"
)]
#[instrument(skip(store))]
pub async fn delete_language(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &LANGUAGES, &id).await
}
