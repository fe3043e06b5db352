//! Client for the JSON content API the site renders from.
//!
//! Endpoints answer with a raw array, `{data: [...]}`, a raw object or
//! `{data: {...}}` depending on the resource. [`Envelope`] accepts all four
//! so callers only ever see the payload.

use crate::storage::Record;
use axum::body::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::{info_span, Instrument};

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
}

/// Payload either bare or wrapped in a `data` member.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// A fetched binary with the content type the upstream declared.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct Upstream {
    client: Client,
    base: String,
}

impl Upstream {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// GETs `path` and decodes the enveloped JSON body. `Ok(None)` on 404.
    async fn json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, UpstreamError> {
        let url = self.url(path);
        let span = info_span!("upstream.fetch", url = %url, status = tracing::field::Empty);

        async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|source| UpstreamError::Request {
                    url: url.clone(),
                    source,
                })?;
            let status = response.status();
            tracing::Span::current().record("status", status.as_u16());

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(UpstreamError::Status { url, status });
            }

            let envelope = response
                .json::<Envelope<T>>()
                .await
                .map_err(|source| UpstreamError::Request {
                    url: url.clone(),
                    source,
                })?;
            Ok(Some(envelope.into_inner()))
        }
        .instrument(span)
        .await
    }

    /// Every record of `resource`. A missing endpoint is an empty list.
    ///
    /// # Errors
    /// Returns an error when the request fails or the body is not a list.
    pub async fn list(&self, resource: &str) -> Result<Vec<Record>, UpstreamError> {
        Ok(self.json(resource).await?.unwrap_or_default())
    }

    /// One record of `resource`, `None` when the upstream has no such id.
    ///
    /// # Errors
    /// Returns an error when the request fails or the body is not an object.
    pub async fn get(&self, resource: &str, id: i64) -> Result<Option<Record>, UpstreamError> {
        self.json(&format!("{resource}/{id}")).await
    }

    /// Raw bytes at `path`, `None` on 404.
    ///
    /// # Errors
    /// Returns an error on transport failures and non-success statuses.
    pub async fn bytes(&self, path: &str) -> Result<Option<Fetched>, UpstreamError> {
        let url = self.url(path);
        let span = info_span!("upstream.fetch", url = %url, status = tracing::field::Empty);

        async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|source| UpstreamError::Request {
                    url: url.clone(),
                    source,
                })?;
            let status = response.status();
            tracing::Span::current().record("status", status.as_u16());

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(UpstreamError::Status { url, status });
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let bytes = response
                .bytes()
                .await
                .map_err(|source| UpstreamError::Request {
                    url: url.clone(),
                    source,
                })?;
            Ok(Some(Fetched {
                content_type,
                bytes,
            }))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! Local HTTP server standing in for the content API.

    use anyhow::Result;
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serves `router` on an ephemeral port and returns its `/api` base URL.
    pub async fn serve(router: Router) -> Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router.into_make_service()).await;
        });
        Ok(format!("http://{addr}/api"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::{http::StatusCode as AxumStatus, routing::get, Json, Router};
    use serde_json::json;

    #[test]
    fn envelope_accepts_every_shape() -> Result<()> {
        let bare: Envelope<Vec<Record>> = serde_json::from_value(json!([{"id": 1}]))?;
        let wrapped: Envelope<Vec<Record>> =
            serde_json::from_value(json!({"data": [{"id": 1}]}))?;
        assert_eq!(bare.into_inner(), wrapped.into_inner());

        let bare: Envelope<Record> = serde_json::from_value(json!({"id": 2, "title": "x"}))?;
        let wrapped: Envelope<Record> =
            serde_json::from_value(json!({"data": {"id": 2, "title": "x"}}))?;
        assert_eq!(bare.into_inner(), wrapped.into_inner());
        Ok(())
    }

    #[tokio::test]
    async fn list_get_and_bytes() -> Result<()> {
        let router = Router::new()
            .route("/api/articles", get(|| async { Json(json!({"data": [{"id": 1}]})) }))
            .route("/api/articles/1", get(|| async { Json(json!({"id": 1, "title": "Salah"})) }))
            .route("/api/writers", get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }))
            .route(
                "/api/articles/1/image",
                get(|| async { ([("content-type", "image/png")], vec![0x89_u8, b'P']) }),
            );
        let base = stub::serve(router).await?;
        let upstream = Upstream::new(&base, Duration::from_secs(2))?;

        assert_eq!(upstream.list("articles").await?.len(), 1);
        assert_eq!(
            upstream
                .get("articles", 1)
                .await?
                .and_then(|record| record.get("title").cloned()),
            Some(json!("Salah"))
        );
        assert!(upstream.get("articles", 2).await?.is_none());
        assert!(matches!(
            upstream.list("writers").await,
            Err(UpstreamError::Status { .. })
        ));

        let fetched = upstream.bytes("articles/1/image").await?;
        assert_eq!(
            fetched.as_ref().and_then(|f| f.content_type.as_deref()),
            Some("image/png")
        );
        assert_eq!(fetched.map(|f| f.bytes.len()), Some(2));
        Ok(())
    }
}
