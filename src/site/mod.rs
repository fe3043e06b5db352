//! Server-rendered public site.
//!
//! Pages are rendered from the JSON content API (usually this same process,
//! reached over HTTP) rather than from the database, so the site can be
//! deployed in front of any instance of the API.

pub mod assets;
pub mod pages;
pub mod proxy;
pub mod render;
pub mod upstream;

use self::{render::Templates, upstream::Upstream};
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::error;

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Content API used for page data, e.g. `http://127.0.0.1:8080/api`.
    pub api_upstream: String,
    /// Content API as seen by browsers and crawlers.
    pub public_api_url: String,
    /// Front-end origin share links redirect to.
    pub frontend_url: String,
    pub timeout: Duration,
}

/// Handles shared by every page handler, built once at startup.
#[derive(Debug)]
pub struct Site {
    pub upstream: Upstream,
    pub public: Upstream,
    pub templates: Templates,
    pub frontend_url: String,
}

impl Site {
    /// # Errors
    /// Returns an error if an HTTP client or the templates cannot be built.
    pub fn new(config: &SiteConfig) -> Result<Arc<Self>> {
        let upstream = Upstream::new(&config.api_upstream, config.timeout)
            .context("Failed to build upstream client")?;
        let public = Upstream::new(&config.public_api_url, config.timeout)
            .context("Failed to build public API client")?;
        let templates = Templates::new().context("Failed to compile templates")?;

        Ok(Arc::new(Self {
            upstream,
            public,
            templates,
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        }))
    }

    #[cfg(test)]
    pub fn for_tests(api: &str) -> Result<Arc<Self>> {
        Self::new(&SiteConfig {
            api_upstream: api.to_string(),
            public_api_url: api.to_string(),
            frontend_url: "https://minaramasjid.com".to_string(),
            timeout: Duration::from_secs(2),
        })
    }

    /// Renders `name` with `status`, or a bare 500 when rendering fails.
    pub fn page<T: Serialize>(&self, status: StatusCode, name: &str, data: &T) -> Response {
        match self.templates.render(name, data) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(err) => {
                error!("Failed to render {name}: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Page routes. Handlers expect an `Extension<Arc<Site>>` layer.
pub fn router() -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/article/:id", get(pages::article))
        .route("/article/:id/:slug", get(pages::article))
        .route("/event/:id", get(pages::event))
        .route("/event/:id/:slug", get(pages::event))
        .route("/book/:id", get(pages::book))
        .route("/book/:id/:slug", get(pages::book))
        .route("/question/:id", get(pages::question))
        .route("/question/:id/:slug", get(pages::question))
        .route("/media/:resource/:id", get(proxy::media))
        .route("/assets/*path", get(assets::asset))
}
