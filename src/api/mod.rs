//! JSON content API and the process that serves it.
//!
//! [`app`] assembles the full router (documented API routes, Swagger UI and
//! the rendered site) so tests can drive it without a socket. [`new`] builds
//! the production handles and serves it until SIGINT or SIGTERM.

pub mod error;
pub mod handlers;
pub mod openapi;
pub mod payload;

use crate::{
    api::{
        error::{expose_db_detail, ApiError},
        handlers::health,
    },
    site::{self, pages::not_found, Site, SiteConfig},
    storage::{postgres::PgStore, Store},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Method, Request, Uri},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::options,
    Router,
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub use self::openapi::openapi;

const REQUEST_ID: &str = "x-request-id";

/// Request handling knobs that do not need a live dependency.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Put the real cause in `DB` error bodies.
    pub development: bool,
    /// Largest accepted request body, in bytes.
    pub body_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            development: false,
            body_limit: 200 * 1024 * 1024,
        }
    }
}

/// Database pool sizing.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
}

/// Build the complete application router.
pub fn app(store: Store, site: Arc<Site>, config: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any);

    let (router, openapi) = openapi::api_router().split_for_parts();

    let mut app = router
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi))
        .merge(site::router())
        .route("/health", options(health::health))
        .fallback(fallback);

    if config.development {
        app = app.layer(map_response(expose_db_detail));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static(REQUEST_ID),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                REQUEST_ID,
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors)
            .layer(DefaultBodyLimit::max(config.body_limit))
            .layer(RequestBodyLimitLayer::new(config.body_limit))
            .layer(Extension(store))
            .layer(Extension(site)),
    )
}

async fn fallback(Extension(site): Extension<Arc<Site>>, uri: Uri) -> Response {
    let path = uri.path();
    if path == "/api" || path.starts_with("/api/") {
        ApiError::NotFound("API route not found".to_string()).into_response()
    } else {
        not_found(&site)
    }
}

/// Connect to the database, build the site client and serve.
///
/// # Errors
/// Returns an error if the database is unreachable, the site cannot be built
/// or the listener fails.
pub async fn new(
    port: u16,
    dsn: &SecretString,
    pool: PoolConfig,
    site: &SiteConfig,
    config: &AppConfig,
) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(pool.max_connections)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    let store: Store = Arc::new(PgStore::new(pool));
    let site = Site::new(site)?;

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app(store, site, config).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    info_span!(
        "http.request",
        method = %request.method(),
        route,
        request_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{FailingStore, MemoryStore};
    use axum::{body::to_bytes, http::StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn router(store: Store, config: &AppConfig) -> anyhow::Result<Router> {
        Ok(app(store, Site::for_tests("http://127.0.0.1:9/api")?, config))
    }

    async fn send(app: Router, request: Request<Body>) -> anyhow::Result<(Response, Value)> {
        let response = app.oneshot(request).await?;
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await?;
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok((Response::from_parts(parts, Body::empty()), json))
    }

    #[tokio::test]
    async fn request_ids_are_generated_and_propagated() -> anyhow::Result<()> {
        let app = router(MemoryStore::shared(), &AppConfig::default())?;

        let (response, _) = send(
            app.clone(),
            Request::builder().uri("/healthz").body(Body::empty())?,
        )
        .await?;
        let generated = response
            .headers()
            .get(REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert_eq!(generated.len(), 26);

        let (response, _) = send(
            app,
            Request::builder()
                .uri("/healthz")
                .header(REQUEST_ID, "abc")
                .body(Body::empty())?,
        )
        .await?;
        assert_eq!(response.headers()[REQUEST_ID], "abc");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_api_routes_are_json() -> anyhow::Result<()> {
        let app = router(MemoryStore::shared(), &AppConfig::default())?;
        let (response, body) = send(
            app.clone(),
            Request::builder().uri("/api/sermons").body(Body::empty())?,
        )
        .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
        assert_eq!(body["message"], "API route not found");

        let (response, body) = send(
            app,
            Request::builder().uri("/nowhere").body(Body::empty())?,
        )
        .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body, Value::Null);
        Ok(())
    }

    #[tokio::test]
    async fn database_detail_only_in_development() -> anyhow::Result<()> {
        let request = || Request::builder().uri("/api/tags").body(Body::empty());

        let app = router(FailingStore::shared(), &AppConfig::default())?;
        let (_, body) = send(app, request()?).await?;
        assert_eq!(body["message"], "Database error");

        let config = AppConfig {
            development: true,
            ..AppConfig::default()
        };
        let app = router(FailingStore::shared(), &config)?;
        let (_, body) = send(app, request()?).await?;
        assert_eq!(body["error"], "DB");
        assert_ne!(body["message"], "Database error");
        Ok(())
    }

    #[tokio::test]
    async fn oversized_bodies_are_rejected() -> anyhow::Result<()> {
        let config = AppConfig {
            body_limit: 16,
            ..AppConfig::default()
        };
        let app = router(MemoryStore::shared(), &config)?;
        let (response, _) = send(
            app,
            Request::builder()
                .method(Method::POST)
                .uri("/api/tags")
                .header("content-type", "application/json")
                .header("content-length", "64")
                .body(Body::from(format!("{{\"tag\":\"{}\"}}", "x".repeat(54))))?,
        )
        .await?;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        Ok(())
    }

    #[tokio::test]
    async fn swagger_serves_the_document() -> anyhow::Result<()> {
        let app = router(MemoryStore::shared(), &AppConfig::default())?;
        let (response, body) = send(
            app,
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())?,
        )
        .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["info"]["title"], "minara");
        Ok(())
    }
}
