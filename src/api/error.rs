//! HTTP error taxonomy.
//!
//! Every failing handler returns an [`ApiError`]. The JSON body is always
//! `{"error": "<KIND>", "message": "..."}`. Database failures are logged with
//! their context and reported with a redacted message; the
//! [`expose_db_detail`] middleware, only installed in the `development`
//! environment, swaps the real cause back in.

use crate::storage::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            error: kind.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{context}: {source}")]
    Db {
        context: &'static str,
        source: StoreError,
    },
    #[error("{0}")]
    Server(String),
}

/// Unredacted cause of a `DB` error, carried as a response extension.
#[derive(Debug, Clone)]
pub struct DbDetail(pub String);

impl ApiError {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Db { .. } => "DB",
            Self::Server(_) => "SERVER",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Db { .. } | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Adapter for `map_err` on store calls.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| match source {
            StoreError::Database(_) => Self::Db { context, source },
            other => Self::Server(format!("{context}: {other}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        match self {
            Self::Validation(message) | Self::NotFound(message) => {
                (status, Json(ErrorBody::new(kind, message))).into_response()
            }
            Self::Db { context, source } => {
                error!(context, "Database error: {source}");
                let mut response =
                    (status, Json(ErrorBody::new(kind, "Database error"))).into_response();
                response
                    .extensions_mut()
                    .insert(DbDetail(format!("{context}: {source}")));
                response
            }
            Self::Server(detail) => {
                error!("Server error: {detail}");
                (status, Json(ErrorBody::new(kind, "Internal server error"))).into_response()
            }
        }
    }
}

/// Replaces the redacted `DB` message with the real cause.
pub async fn expose_db_detail(mut response: Response) -> Response {
    match response.extensions_mut().remove::<DbDetail>() {
        Some(DbDetail(detail)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("DB", detail)),
        )
            .into_response(),
        None => response,
    }
}
