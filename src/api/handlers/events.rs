//! News and event handlers.

use super::{
    clear_blob, create, fetch, fill_slugs, list, parse_id, remove, slug_assignment, update,
    Created, Document, Message,
};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::EVENTS, ListFilter, Record, Store},
    text::{plain_text, Language},
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use serde_json::Value;
use tracing::instrument;

const REQUIRED: [&str; 5] = ["title", "topic", "language", "eventDate", "venue"];

/// Adds `<language>DescriptionText` next to every description variant.
fn with_plain_descriptions(mut row: Record) -> Record {
    for language in Language::ALL {
        let key = language.key("Description");
        let text = row
            .get(&key)
            .and_then(Value::as_str)
            .map(plain_text)
            .unwrap_or_default();
        row.insert(format!("{key}Text"), Value::String(text));
    }
    row
}

/// The slug comes from an explicit `slug` field when sent, else the title.
#[utoipa::path(
    post,
    path = "/api/events",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Event created", body = Created),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
    ),
    tag = "events"
)]
#[instrument(skip(store, payload))]
pub async fn create_event(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&REQUIRED)?;
    let mut values = payload.assignments(&EVENTS)?;
    values.extend(slug_assignment(&EVENTS, &payload, None, true)?);
    create(&store, &EVENTS, values).await
}

#[utoipa::path(
    get,
    path = "/api/events",
    responses(
        (status = 200, description = "Events with plain-text descriptions", body = [Document]),
    ),
    tag = "events"
)]
#[instrument(skip(store))]
pub async fn list_events(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let mut rows = list(&store, &EVENTS, &ListFilter::new()).await?;
    fill_slugs(&EVENTS, &mut rows);
    Ok(Json(
        rows.into_iter()
            .map(with_plain_descriptions)
            .map(Document)
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = Document),
        (status = 404, description = "Event not found", body = ErrorBody),
    ),
    tag = "events"
)]
#[instrument(skip(store))]
pub async fn get_event(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &EVENTS, &id).await?)))
}

#[utoipa::path(
    get,
    path = "/api/events/{id}/image",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event image"),
        (status = 404, description = "No image stored", body = ErrorBody),
    ),
    tag = "events"
)]
#[instrument(skip(store))]
pub async fn event_image(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &EVENTS, "image", &id).await
}

#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Event updated", body = Message),
        (status = 400, description = "Invalid fields", body = ErrorBody),
        (status = 404, description = "Event not found", body = ErrorBody),
    ),
    tag = "events"
)]
#[instrument(skip(store, payload))]
pub async fn update_event(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let existing = fetch(&store, &EVENTS, &id).await?;
    let mut values = payload.assignments(&EVENTS)?;
    values.extend(slug_assignment(&EVENTS, &payload, Some(&existing), true)?);
    if payload.flag("removeImage") && payload.file("image").is_none() {
        values.extend(clear_blob(&EVENTS, "image"));
    }
    update(&store, &EVENTS, parse_id(&id)?, values).await
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event deleted", body = Message),
        (status = 404, description = "Event not found", body = ErrorBody),
    ),
    tag = "events"
)]
#[instrument(skip(store))]
pub async fn delete_event(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &EVENTS, &id).await
}

#[cfg(test)]
mod tests {
    use crate::api::handlers::testing::{app, created_id, get, json, store};
    use anyhow::Result;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn explicit_slug_and_plain_descriptions() -> Result<()> {
        let app = app(&store())?;
        let (status, body) = json(
            &app,
            Method::POST,
            "/api/events",
            json!({
                "title": "Annual Gathering",
                "slug": "Jalsa 2024!",
                "topic": "Community",
                "language": "Urdu",
                "eventDate": "2024-05-01",
                "venue": "Main hall",
                "englishDescription": "<p>Join us &amp; <b>friends</b></p>",
            }),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
        let id = created_id(&body);

        let (_, body) = get(&app, &format!("/api/events/{id}")).await?;
        assert_eq!(body["slug"], "jalsa-2024");
        assert_eq!(body["eventDate"], "2024-05-01");

        let (_, body) = get(&app, "/api/events").await?;
        assert_eq!(body[0]["englishDescriptionText"], "Join us & friends");
        assert_eq!(body[0]["urduDescriptionText"], "");
        Ok(())
    }

    #[tokio::test]
    async fn venue_is_required() -> Result<()> {
        let app = app(&store())?;
        let (status, body) = json(
            &app,
            Method::POST,
            "/api/events",
            json!({"title": "Eid", "topic": "Eid", "language": "English", "eventDate": "2024-04-10"}),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Required fields: venue");
        Ok(())
    }

    #[tokio::test]
    async fn invalid_dates_are_rejected() -> Result<()> {
        let app = app(&store())?;
        let (status, body) = json(
            &app,
            Method::POST,
            "/api/events",
            json!({
                "title": "Eid",
                "topic": "Eid",
                "language": "English",
                "eventDate": "tomorrow",
                "venue": "Hall",
            }),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION");
        Ok(())
    }
}
