//! Book covers rotating on the home page.

use super::{create, fetch, list, parse_id, remove, update, Created, Document, Message};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::HOME_BOOK_SLIDER, ListFilter, Store},
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/homebookslider",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Slide created", body = Created),
        (status = 400, description = "Book name or image missing", body = ErrorBody),
    ),
    tag = "homebookslider"
)]
#[instrument(skip(store, payload))]
pub async fn create_slide(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&["bookName", "bookImage"])?;
    let values = payload.assignments(&HOME_BOOK_SLIDER)?;
    create(&store, &HOME_BOOK_SLIDER, values).await
}

#[utoipa::path(
    get,
    path = "/api/homebookslider",
    responses(
        (status = 200, description = "Slides, newest first", body = [Document]),
    ),
    tag = "homebookslider"
)]
#[instrument(skip(store))]
pub async fn list_slides(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let rows = list(&store, &HOME_BOOK_SLIDER, &ListFilter::new()).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/homebookslider/{id}",
    params(("id" = i64, Path, description = "Slide id")),
    responses(
        (status = 200, description = "Slide", body = Document),
        (status = 404, description = "Slide not found", body = ErrorBody),
    ),
    tag = "homebookslider"
)]
#[instrument(skip(store))]
pub async fn get_slide(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &HOME_BOOK_SLIDER, &id).await?)))
}

#[utoipa::path(
    get,
    path = "/api/homebookslider/{id}/image",
    params(("id" = i64, Path, description = "Slide id")),
    responses(
        (status = 200, description = "Book cover"),
        (status = 404, description = "Slide not found", body = ErrorBody),
    ),
    tag = "homebookslider"
)]
#[instrument(skip(store))]
pub async fn slide_image(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &HOME_BOOK_SLIDER, "bookImage", &id).await
}

#[utoipa::path(
    put,
    path = "/api/homebookslider/{id}",
    params(("id" = i64, Path, description = "Slide id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Slide updated", body = Message),
        (status = 404, description = "Slide not found", body = ErrorBody),
    ),
    tag = "homebookslider"
)]
#[instrument(skip(store, payload))]
pub async fn update_slide(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    if payload.contains("bookName") && payload.text("bookName").is_none() {
        return Err(ApiError::Validation("bookName cannot be empty".to_string()));
    }
    let values = payload.assignments(&HOME_BOOK_SLIDER)?;
    update(&store, &HOME_BOOK_SLIDER, id, values).await
}

#[utoipa::path(
    delete,
    path = "/api/homebookslider/{id}",
    params(("id" = i64, Path, description = "Slide id")),
    responses(
        (status = 200, description = "Slide deleted", body = Message),
        (status = 404, description = "Slide not found", body = ErrorBody),
    ),
    tag = "homebookslider"
)]
#[instrument(skip(store))]
pub async fn delete_slide(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &HOME_BOOK_SLIDER, &id).await
}
