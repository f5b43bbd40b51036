use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::cms::CmsClient;
use crate::config::Config;
use crate::error::CmsError;
use crate::html::site_host;
use crate::search::SearchEngine;

pub mod handlers;
pub mod models;

/// Shared, read-only state for every handler.
pub struct AppState {
    pub cms: CmsClient,
    pub search: SearchEngine,
    /// Host of the public site; links elsewhere are annotated as external.
    pub site_host: Option<String>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, CmsError> {
        let cms = CmsClient::new(config)?;
        Ok(Self {
            search: SearchEngine::with_default_sources(cms.clone()),
            cms,
            site_host: config.public_site_url.as_deref().and_then(site_host),
        })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", get(handlers::search_handler))
        .route("/search", get(handlers::search_page_handler))
        .route("/api/layout", get(handlers::layout_handler))
        .route("/api/pages", get(handlers::home_page_handler))
        .route("/api/pages/*permalink", get(handlers::page_handler))
        .route(
            "/api/nettverkskonferanser/:permalink",
            get(handlers::conference_handler),
        )
        .route("/assets/:id", get(handlers::asset_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
