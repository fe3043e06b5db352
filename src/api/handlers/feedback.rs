//! Visitor feedback: public create, admin list.

use super::{create, fetch, list, remove, valid_email, Created, Document, Message};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        payload::FormPayload,
    },
    storage::{schema::FEEDBACK, ListFilter, Store},
};
use axum::{
    extract::{Extension, Path},
    response::Response,
    Json,
};
use tracing::instrument;

#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body(content = Document, description = "`{\"name\", \"email\", \"feedback\"}`"),
    responses(
        (status = 201, description = "Feedback stored", body = Created),
        (status = 400, description = "Missing fields or invalid email", body = ErrorBody),
    ),
    tag = "feedback"
)]
#[instrument(skip(store, payload))]
pub async fn create_feedback(
    store: Extension<Store>,
    payload: FormPayload,
) -> Result<Response, ApiError> {
    payload.require(&["name", "email", "feedback"])?;
    if !payload.text("email").is_some_and(valid_email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    let values = payload.assignments(&FEEDBACK)?;
    create(&store, &FEEDBACK, values).await
}

#[utoipa::path(
    get,
    path = "/api/feedback",
    responses(
        (status = 200, description = "Feedback, newest first", body = [Document]),
    ),
    tag = "feedback"
)]
#[instrument(skip(store))]
pub async fn list_feedback(store: Extension<Store>) -> Result<Json<Vec<Document>>, ApiError> {
    let rows = list(&store, &FEEDBACK, &ListFilter::new()).await?;
    Ok(Json(rows.into_iter().map(Document).collect()))
}

#[utoipa::path(
    get,
    path = "/api/feedback/{id}",
    params(("id" = i64, Path, description = "Feedback id")),
    responses(
        (status = 200, description = "Feedback", body = Document),
        (status = 404, description = "Feedback not found", body = ErrorBody),
    ),
    tag = "feedback"
)]
#[instrument(skip(store))]
pub async fn get_feedback(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(Document(fetch(&store, &FEEDBACK, &id).await?)))
}

#[utoipa::path(
    delete,
    path = "/api/feedback/{id}",
    params(("id" = i64, Path, description = "Feedback id")),
    responses(
        (status = 200, description = "Feedback deleted", body = Message),
        (status = 404, description = "Feedback not found", body = ErrorBody),
    ),
    tag = "feedback"
)]
#[instrument(skip(store))]
pub async fn delete_feedback(
    store: Extension<Store>,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    remove(&store, &FEEDBACK, &id).await
}

#[cfg(test)]
mod tests {
    use crate::api::handlers::testing::{app, get, json, store};
    use anyhow::Result;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn feedback_requires_a_valid_email() -> Result<()> {
        let app = app(&store())?;
        let (status, body) = json(
            &app,
            Method::POST,
            "/api/feedback",
            json!({"name": "Zaid", "email": "zaid-at-example", "feedback": "Great site"}),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid email address");

        let (status, _) = json(
            &app,
            Method::POST,
            "/api/feedback",
            json!({"name": "Zaid", "email": "zaid@example.com", "feedback": "Great site"}),
        )
        .await?;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = get(&app, "/api/feedback").await?;
        assert_eq!(body[0]["feedback"], "Great site");
        Ok(())
    }
}
