//! Writer profile handlers.

use super::{
    clear_blob, create, fetch, list, parse_id, remove, update, valid_email, Created, Document,
    Message,
};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::{truthy, FormPayload},
    },
    storage::{schema::WRITERS, ListFilter, Store, Value},
};
use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    Json,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::IntoParams;

const REQUIRED: [&str; 4] = ["name", "email", "joinedDate", "status"];

const STATUSES: [&str; 2] = ["Active", "InActive"];

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct WriterQuery {
    /// `Active` or `InActive`.
    pub status: Option<String>,
    /// `true` for team members only.
    pub team: Option<String>,
}

fn check_status(status: Option<&str>) -> Result<(), ApiError> {
    match status {
        Some(status) if !STATUSES.contains(&status) => Err(ApiError::Validation(format!(
            "status must be one of: {}",
            STATUSES.join(", ")
        ))),
        _ => Ok(()),
    }
}

fn check_email(payload: &FormPayload) -> Result<(), ApiError> {
    match payload.text("email") {
        Some(email) if !valid_email(email) => {
            Err(ApiError::Validation("Invalid email address".to_string()))
        }
        _ => Ok(()),
    }
}

#[utoipa::path(
    post,
    path = "/api/writers",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Writer created", body = Created),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
    ),
    tag = "writers"
)]
#[instrument(skip(store, payload))]
pub async fn create_writer(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&REQUIRED)?;
    check_email(&payload)?;
    check_status(payload.text("status"))?;
    let values = payload.assignments(&WRITERS)?;
    create(&store, &WRITERS, values).await
}

#[utoipa::path(
    get,
    path = "/api/writers",
    params(WriterQuery),
    responses(
        (status = 200, description = "Writers, newest first", body = [Document]),
        (status = 400, description = "Unknown status", body = ErrorBody),
    ),
    tag = "writers"
)]
#[instrument(skip(store))]
pub async fn list_writers(
    store: Extension<Store>,
    Query(query): Query<WriterQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let status = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty());
    check_status(status)?;

    let mut filter = ListFilter::new();
    if let (Some(column), Some(status)) = (WRITERS.column("status"), status) {
        filter = filter.equals(column, Value::Text(Some(status.to_string())));
    }
    if let (Some(column), Some(team)) = (WRITERS.column("isTeamMember"), query.team.as_deref()) {
        filter = filter.equals(column, Value::Bool(truthy(team)));
    }

    let rows = list(&store, &WRITERS, &filter).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/writers/{id}",
    params(("id" = i64, Path, description = "Writer id")),
    responses(
        (status = 200, description = "Writer", body = Document),
        (status = 404, description = "Writer not found", body = ErrorBody),
    ),
    tag = "writers"
)]
#[instrument(skip(store))]
pub async fn get_writer(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &WRITERS, &id).await?)))
}

#[utoipa::path(
    get,
    path = "/api/writers/{id}/image",
    params(("id" = i64, Path, description = "Writer id")),
    responses(
        (status = 200, description = "Writer photo"),
        (status = 404, description = "No photo stored", body = ErrorBody),
    ),
    tag = "writers"
)]
#[instrument(skip(store))]
pub async fn writer_image(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &WRITERS, "image", &id).await
}

#[utoipa::path(
    put,
    path = "/api/writers/{id}",
    params(("id" = i64, Path, description = "Writer id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Writer updated", body = Message),
        (status = 400, description = "Invalid fields", body = ErrorBody),
        (status = 404, description = "Writer not found", body = ErrorBody),
    ),
    tag = "writers"
)]
#[instrument(skip(store, payload))]
pub async fn update_writer(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    check_email(&payload)?;
    check_status(payload.text("status"))?;
    let mut values = payload.assignments(&WRITERS)?;
    if payload.flag("removeImage") && payload.file("image").is_none() {
        values.extend(clear_blob(&WRITERS, "image"));
    }
    update(&store, &WRITERS, id, values).await
}

#[utoipa::path(
    delete,
    path = "/api/writers/{id}",
    params(("id" = i64, Path, description = "Writer id")),
    responses(
        (status = 200, description = "Writer deleted", body = Message),
        (status = 404, description = "Writer not found", body = ErrorBody),
    ),
    tag = "writers"
)]
#[instrument(skip(store))]
pub async fn delete_writer(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &WRITERS, &id).await
}
