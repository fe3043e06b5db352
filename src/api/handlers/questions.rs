//! Question and answer handlers.
//!
//! Each entry holds up to four (question, answer) language pairs. The slug
//! follows an explicit `slug` field or the first question that yields one,
//! and is re-derived whenever a question variant changes on update.

use super::{
    clear_blob, create, fetch, fill_slugs, list, parse_id, remove, slug_assignment, update,
    Created, Document, Message,
};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::QUESTIONS, ListFilter, Record, Store},
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use serde_json::Value;
use tracing::instrument;

const REQUIRED: [&str; 6] = ["writer", "date", "language", "topic", "answeredStatus", "image"];

const ANSWERED_STATUSES: [&str; 3] = ["yes", "no", "in progress"];

fn check_answered_status(payload: &FormPayload) -> Result<(), ApiError> {
    match payload.text("answeredStatus") {
        Some(status) if !ANSWERED_STATUSES.contains(&status.to_lowercase().as_str()) => {
            Err(ApiError::Validation(format!(
                "answeredStatus must be one of: {}",
                ANSWERED_STATUSES.join(", ")
            )))
        }
        _ => Ok(()),
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// True when `tag` is one of the comma-separated tags or the topic.
fn tagged(record: &Record, tag: &str) -> bool {
    let field = |name: &str| record.get(name).and_then(Value::as_str).unwrap_or_default();
    field("tags").split(',').map(normalize_tag).any(|t| t == tag) || normalize_tag(field("topic")) == tag
}

#[utoipa::path(
    post,
    path = "/api/questions",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Question created", body = Created),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
    ),
    tag = "questions"
)]
#[instrument(skip(store, payload))]
pub async fn create_question(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&REQUIRED)?;
    check_answered_status(&payload)?;
    let mut values = payload.assignments(&QUESTIONS)?;
    values.extend(slug_assignment(&QUESTIONS, &payload, None, true)?);
    create(&store, &QUESTIONS, values).await
}

#[utoipa::path(
    get,
    path = "/api/questions",
    responses(
        (status = 200, description = "Questions without answer bodies", body = [Document]),
    ),
    tag = "questions"
)]
#[instrument(skip(store))]
pub async fn list_questions(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let mut rows = list(&store, &QUESTIONS, &ListFilter::new()).await?;
    fill_slugs(&QUESTIONS, &mut rows);
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/questions/tag/{tag}",
    params(("tag" = String, Path, description = "Tag or topic, case-insensitive")),
    responses(
        (status = 200, description = "Questions with the tag", body = [Document]),
        (status = 404, description = "No question carries the tag", body = ErrorBody),
    ),
    tag = "questions"
)]
#[instrument(skip(store))]
pub async fn questions_by_tag(
    store: Extension<Store>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let tag = normalize_tag(&tag);
    if tag.is_empty() {
        return Err(ApiError::Validation("Tag is required".to_string()));
    }

    let mut rows: Vec<Record> = list(&store, &QUESTIONS, &ListFilter::new())
        .await?
        .into_iter()
        .filter(|row| tagged(row, &tag))
        .collect();
    if rows.is_empty() {
        return Err(ApiError::NotFound(format!("No questions tagged {tag}")));
    }

    fill_slugs(&QUESTIONS, &mut rows);
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/questions/{id}",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question with answers", body = Document),
        (status = 404, description = "Question not found", body = ErrorBody),
    ),
    tag = "questions"
)]
#[instrument(skip(store))]
pub async fn get_question(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &QUESTIONS, &id).await?)))
}

#[utoipa::path(
    get,
    path = "/api/questions/{id}/image",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question image"),
        (status = 404, description = "No image stored", body = ErrorBody),
    ),
    tag = "questions"
)]
#[instrument(skip(store))]
pub async fn question_image(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &QUESTIONS, "image", &id).await
}

#[utoipa::path(
    put,
    path = "/api/questions/{id}",
    params(("id" = i64, Path, description = "Question id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Question updated", body = Message),
        (status = 400, description = "Invalid fields", body = ErrorBody),
        (status = 404, description = "Question not found", body = ErrorBody),
    ),
    tag = "questions"
)]
#[instrument(skip(store, payload))]
pub async fn update_question(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    check_answered_status(&payload)?;
    let existing = fetch(&store, &QUESTIONS, &id).await?;
    let mut values = payload.assignments(&QUESTIONS)?;
    values.extend(slug_assignment(&QUESTIONS, &payload, Some(&existing), true)?);
    if payload.flag("removeImage") && payload.file("image").is_none() {
        values.extend(clear_blob(&QUESTIONS, "image"));
    }
    update(&store, &QUESTIONS, parse_id(&id)?, values).await
}

#[utoipa::path(
    delete,
    path = "/api/questions/{id}",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question deleted", body = Message),
        (status = 404, description = "Question not found", body = ErrorBody),
    ),
    tag = "questions"
)]
#[instrument(skip(store))]
pub async fn delete_question(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &QUESTIONS, &id).await
}
