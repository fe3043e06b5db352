//! Book handlers. Every book has a cover image and a PDF attachment.

use super::{
    create, fetch, fill_slugs, list, parse_id, remove, slug_assignment, update, Created,
    Document, Message,
};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::BOOKS, ListFilter, Store},
    text::plain_text,
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use serde_json::Value;
use tracing::instrument;

const REQUIRED: [&str; 11] = [
    "title",
    "isbn",
    "description",
    "author",
    "bookDate",
    "status",
    "category",
    "isPublished",
    "language",
    "coverImage",
    "attachment",
];

#[utoipa::path(
    post,
    path = "/api/books",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Book created", body = Created),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
    ),
    tag = "books"
)]
#[instrument(skip(store, payload))]
pub async fn create_book(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&REQUIRED)?;
    let mut values = payload.assignments(&BOOKS)?;
    values.extend(slug_assignment(&BOOKS, &payload, None, false)?);
    create(&store, &BOOKS, values).await
}

#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "Books with plain-text descriptions", body = [Document]),
    ),
    tag = "books"
)]
#[instrument(skip(store))]
pub async fn list_books(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let mut rows = list(&store, &BOOKS, &ListFilter::new()).await?;
    fill_slugs(&BOOKS, &mut rows);
    for row in &mut rows {
        if let Some(Value::String(description)) = row.get_mut("description") {
            *description = plain_text(description);
        }
    }
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book", body = Document),
        (status = 404, description = "Book not found", body = ErrorBody),
    ),
    tag = "books"
)]
#[instrument(skip(store))]
pub async fn get_book(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &BOOKS, &id).await?)))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/cover",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Cover image"),
        (status = 404, description = "No cover stored", body = ErrorBody),
    ),
    tag = "books"
)]
#[instrument(skip(store))]
pub async fn book_cover(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &BOOKS, "coverImage", &id).await
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/attachment",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "PDF attachment", content_type = "application/pdf"),
        (status = 404, description = "No attachment stored", body = ErrorBody),
    ),
    tag = "books"
)]
#[instrument(skip(store))]
pub async fn book_attachment(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &BOOKS, "attachment", &id).await
}

/// Partial update; omitted files keep their stored bytes.
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Book updated", body = Message),
        (status = 400, description = "Invalid fields", body = ErrorBody),
        (status = 404, description = "Book not found", body = ErrorBody),
    ),
    tag = "books"
)]
#[instrument(skip(store, payload))]
pub async fn update_book(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let existing = fetch(&store, &BOOKS, &id).await?;
    let mut values = payload.assignments(&BOOKS)?;
    values.extend(slug_assignment(&BOOKS, &payload, Some(&existing), false)?);
    update(&store, &BOOKS, parse_id(&id)?, values).await
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted", body = Message),
        (status = 404, description = "Book not found", body = ErrorBody),
    ),
    tag = "books"
)]
#[instrument(skip(store))]
pub async fn delete_book(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &BOOKS, &id).await
}
