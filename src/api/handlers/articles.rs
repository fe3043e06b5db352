//! Article CRUD handlers.
//!
//! Articles carry up to four language variants and an optional cover image.
//! The slug is derived from the first title that yields one and rewritten
//! whenever a title changes.

use super::{
    clear_blob, create, fetch, fill_slugs, list, parse_id, remove, slug_assignment, update,
    Created, Document, Message,
};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::{truthy, FormPayload},
    },
    storage::{schema::ARTICLES, Assignment, ListFilter, Store, Value},
};
use axum::{
    extract::{Extension, Path, Query},
    response::Response,
    Json,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::IntoParams;

const REQUIRED: [&str; 6] = ["title", "topic", "writers", "language", "date", "isPublished"];

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ArticleQuery {
    /// Exact topic.
    pub topic: Option<String>,
    /// Exact language.
    pub language: Option<String>,
    /// `true` for published articles only, `false` for drafts only.
    pub published: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/articles",
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Article created", body = Created),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
    ),
    tag = "articles"
)]
#[instrument(skip(store, payload))]
pub async fn create_article(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&REQUIRED)?;
    let mut values = payload.assignments(&ARTICLES)?;
    values.extend(slug_assignment(&ARTICLES, &payload, None, false)?);
    create(&store, &ARTICLES, values).await
}

#[utoipa::path(
    get,
    path = "/api/articles",
    params(ArticleQuery),
    responses(
        (status = 200, description = "Articles, newest first", body = [Document]),
    ),
    tag = "articles"
)]
#[instrument(skip(store))]
pub async fn list_articles(
    store: Extension<Store>,
    Query(query): Query<ArticleQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let mut filter = ListFilter::new();
    for (field, value) in [("topic", &query.topic), ("language", &query.language)] {
        let (Some(column), Some(value)) = (ARTICLES.column(field), value.as_deref()) else {
            continue;
        };
        filter = filter.equals(column, Value::Text(Some(value.trim().to_string())));
    }
    if let (Some(column), Some(published)) =
        (ARTICLES.column("isPublished"), query.published.as_deref())
    {
        filter = filter.equals(column, Value::Bool(truthy(published)));
    }

    let mut rows = list(&store, &ARTICLES, &filter).await?;
    fill_slugs(&ARTICLES, &mut rows);
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    params(("id" = i64, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article", body = Document),
        (status = 404, description = "Article not found", body = ErrorBody),
    ),
    tag = "articles"
)]
#[instrument(skip(store))]
pub async fn get_article(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &ARTICLES, &id).await?)))
}

#[utoipa::path(
    get,
    path = "/api/articles/{id}/image",
    params(("id" = i64, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article image"),
        (status = 404, description = "No image stored", body = ErrorBody),
    ),
    tag = "articles"
)]
#[instrument(skip(store))]
pub async fn article_image(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    super::blob(&store, &ARTICLES, "image", &id).await
}

/// Partial update: only the fields sent are written. `removeImage=true`
/// clears the stored image unless a new one is uploaded.
#[utoipa::path(
    put,
    path = "/api/articles/{id}",
    params(("id" = i64, Path, description = "Article id")),
    request_body(content = Document, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Article updated", body = Message),
        (status = 400, description = "Invalid fields", body = ErrorBody),
        (status = 404, description = "Article not found", body = ErrorBody),
    ),
    tag = "articles"
)]
#[instrument(skip(store, payload))]
pub async fn update_article(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    let existing = fetch(&store, &ARTICLES, &id).await?;
    let mut values = payload.assignments(&ARTICLES)?;
    values.extend(slug_assignment(&ARTICLES, &payload, Some(&existing), false)?);
    if payload.flag("removeImage") && payload.file("image").is_none() {
        values.extend(clear_blob(&ARTICLES, "image"));
    }
    update(&store, &ARTICLES, parse_id(&id)?, values).await
}

#[utoipa::path(
    patch,
    path = "/api/articles/{id}/publish",
    params(("id" = i64, Path, description = "Article id")),
    request_body(content = Document, description = "`{\"isPublished\": true}`"),
    responses(
        (status = 200, description = "Publication state changed", body = Message),
        (status = 400, description = "isPublished missing", body = ErrorBody),
        (status = 404, description = "Article not found", body = ErrorBody),
    ),
    tag = "articles"
)]
#[instrument(skip(store, payload))]
pub async fn publish_article(
    store: Extension<Store>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> Result<Json<Message>, ApiError> {
    payload.require(&["isPublished"])?;
    let column = ARTICLES
        .column("isPublished")
        .ok_or_else(|| ApiError::Server("articles has no isPublished column".to_string()))?;
    let values = vec![Assignment::column(
        column,
        Value::Bool(payload.flag("isPublished")),
    )];
    update(&store, &ARTICLES, parse_id(&id)?, values).await
}

#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    params(("id" = i64, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article deleted", body = Message),
        (status = 404, description = "Article not found", body = ErrorBody),
    ),
    tag = "articles"
)]
#[instrument(skip(store))]
pub async fn delete_article(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &ARTICLES, &id).await
}

#[cfg(test)]
mod tests {
    use crate::api::handlers::testing::{app, created_id, delete, get, json, multipart, send, store};
    use anyhow::Result;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn article(title: &str) -> serde_json::Value {
        json!({
            "title": title,
            "topic": "Quran",
            "writers": "Mufti Ali",
            "language": "English",
            "date": "2024-03-01",
            "isPublished": true,
            "englishDescription": "<p>Opening chapter</p>",
        })
    }

    #[tokio::test]
    async fn create_fetch_and_list() -> Result<()> {
        let app = app(&store())?;
        let (status, body) = json(
            &app,
            Method::POST,
            "/api/articles",
            article("Al-Fatiha: An Introduction"),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Article created successfully");
        let id = created_id(&body);

        let (status, body) = get(&app, &format!("/api/articles/{id}")).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "al-fatiha-an-introduction");
        assert_eq!(body["isPublished"], true);
        assert_eq!(body["isDeleted"], false);
        assert_eq!(body["hasImage"], false);

        let (status, body) = get(&app, "/api/articles?topic=Quran&published=true").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let (_, body) = get(&app, "/api/articles?published=false").await?;
        assert_eq!(body.as_array().map(Vec::len), Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_are_listed() -> Result<()> {
        let app = app(&store())?;
        let (status, body) = json(
            &app,
            Method::POST,
            "/api/articles",
            json!({"title": "Only a title"}),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION");
        assert_eq!(
            body["message"],
            "Required fields: topic, writers, language, date, isPublished"
        );
        Ok(())
    }

    #[tokio::test]
    async fn deleted_articles_are_not_found() -> Result<()> {
        let app = app(&store())?;
        let (_, body) = json(&app, Method::POST, "/api/articles", article("Eid")).await?;
        let id = created_id(&body);

        let (status, _) = delete(&app, &format!("/api/articles/{id}")).await?;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = get(&app, &format!("/api/articles/{id}")).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");

        let (status, _) = delete(&app, &format!("/api/articles/{id}")).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = get(&app, "/api/articles").await?;
        assert_eq!(body.as_array().map(Vec::len), Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn partial_update_rewrites_slug_and_removes_image() -> Result<()> {
        let app = app(&store())?;
        let request = multipart(
            Method::POST,
            "/api/articles",
            &[
                ("title", "Old"),
                ("topic", "Quran"),
                ("writers", "Ali"),
                ("language", "Urdu"),
                ("date", "2024-01-01"),
                ("isPublished", "false"),
            ],
            &[("image", "cover.jpg", "image/jpeg", &[0xFF_u8, 0xD8, 0xFF, 0x00][..])],
        )?;
        let (status, body) = send(&app, request).await?;
        assert_eq!(status, StatusCode::CREATED);
        let id = created_id(&body);

        let (_, body) = get(&app, &format!("/api/articles/{id}")).await?;
        assert_eq!(body["hasImage"], true);
        assert_eq!(body["imageType"], "image/jpeg");

        let (status, _) = json(
            &app,
            Method::PUT,
            &format!("/api/articles/{id}"),
            json!({"title": "New Title", "removeImage": "true"}),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get(&app, &format!("/api/articles/{id}")).await?;
        assert_eq!(body["slug"], "new-title");
        assert_eq!(body["topic"], "Quran");
        assert_eq!(body["hasImage"], false);
        assert_eq!(body["imageType"], serde_json::Value::Null);

        let (status, _) = get(&app, &format!("/api/articles/{id}/image")).await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn publish_toggle() -> Result<()> {
        let app = app(&store())?;
        let (_, body) = json(&app, Method::POST, "/api/articles", article("Draft")).await?;
        let id = created_id(&body);

        let uri = format!("/api/articles/{id}/publish");
        let (status, _) = json(&app, Method::PATCH, &uri, json!({})).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = json(&app, Method::PATCH, &uri, json!({"isPublished": false})).await?;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = get(&app, &format!("/api/articles/{id}")).await?;
        assert_eq!(body["isPublished"], false);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_ids_are_rejected() -> Result<()> {
        let app = app(&store())?;
        let (status, body) = get(&app, "/api/articles/abc").await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION");
        Ok(())
    }
}
