use crate::{
    api::error::{ApiError, ErrorBody},
    storage::{
        schema::{ARTICLES, BOOKS, FEEDBACK, QUESTIONS, TRANSLATORS, WRITERS},
        Store, Table,
    },
};
use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

/// Live record counts shown on the admin dashboard.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub writer_count: i64,
    pub translator_count: i64,
    pub book_count: i64,
    pub article_count: i64,
    pub question_count: i64,
    pub feedback_count: i64,
}

async fn count(store: &Store, table: &'static Table) -> Result<i64, ApiError> {
    store
        .count(table)
        .await
        .map_err(ApiError::store("count records"))
}

#[utoipa::path(
    get,
    path = "/api/books/count",
    responses(
        (status = 200, description = "Live record counts", body = Counts),
        (status = 500, description = "Database error", body = ErrorBody),
    ),
    tag = "stats"
)]
#[instrument(skip(store))]
pub async fn counts(store: Extension<Store>) -> Result<Json<Counts>, ApiError> {
    let (writers, translators, books, articles, questions, feedback) = tokio::try_join!(
        count(&store, &WRITERS),
        count(&store, &TRANSLATORS),
        count(&store, &BOOKS),
        count(&store, &ARTICLES),
        count(&store, &QUESTIONS),
        count(&store, &FEEDBACK),
    )?;

    Ok(Json(Counts {
        writer_count: writers,
        translator_count: translators,
        book_count: books,
        article_count: articles,
        question_count: questions,
        feedback_count: feedback,
    }))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::handlers::testing::{app, delete, get, json, send},
        storage::memory::{FailingStore, MemoryStore},
    };
    use anyhow::Result;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn counts_skip_deleted_records() -> Result<()> {
        let app = app(&MemoryStore::shared())?;
        for name in ["A", "B"] {
            json(
                &app,
                Method::POST,
                "/api/feedback",
                json!({"name": name, "email": "a@b.co", "feedback": "salaam"}),
            )
            .await?;
        }
        delete(&app, "/api/feedback/1").await?;

        let (status, body) = get(&app, "/api/books/count").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["feedbackCount"], 1);
        assert_eq!(body["bookCount"], 0);
        Ok(())
    }

    #[tokio::test]
    async fn database_errors_are_redacted() -> Result<()> {
        let app = app(&FailingStore::shared())?;
        let request = axum::http::Request::builder()
            .uri("/api/books/count")
            .body(axum::body::Body::empty())?;
        let (status, body) = send(&app, request).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "DB");
        assert_eq!(body["message"], "Database error");
        Ok(())
    }
}
