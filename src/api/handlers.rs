use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::error;

use crate::cms::collections;
use crate::html::process_document;
use crate::search::SearchOutcome;

use super::AppState;
use super::models::{LayoutData, PageData, SearchPageData, SearchParams, SearchResponse};

const HOME_PERMALINK: &str = "home";
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<SearchResponse>) {
    let query = params.q.unwrap_or_default();
    search_response(&query, guarded(state.search.search(&query)).await)
}

// A collection failing is absorbed inside the engine. `None` here means the
// aggregation itself broke.
fn search_response(query: &str, outcome: Option<SearchOutcome>) -> (StatusCode, Json<SearchResponse>) {
    match outcome {
        Some(outcome) => (StatusCode::OK, Json(outcome.into())),
        None => {
            error!(query = %query, "search aggregation panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SearchResponse::failed("Search failed")),
            )
        }
    }
}

/// Loader for the search page: same engine and same raw query as
/// `/api/search`, trimmed query echoed back, failures reported in `error`
/// instead of the status code.
pub async fn search_page_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchPageData> {
    let raw = params.q.unwrap_or_default();
    let query = raw.trim().to_string();
    if query.is_empty() {
        return Json(SearchPageData::default());
    }

    match guarded(state.search.search(&raw)).await {
        Some(outcome) => Json(SearchPageData {
            results: outcome.results,
            total: outcome.total,
            query,
            error: None,
        }),
        None => {
            error!(query = %query, "search page load failed");
            Json(SearchPageData {
                query,
                error: Some("Søket feilet".to_string()),
                ..Default::default()
            })
        }
    }
}

/// Runs `fut`, turning a panic into `None`.
async fn guarded<F: Future>(fut: F) -> Option<F::Output> {
    AssertUnwindSafe(fut).catch_unwind().await.ok()
}

/// Navigation and site settings. Each falls back independently.
pub async fn layout_handler(State(state): State<Arc<AppState>>) -> Json<LayoutData> {
    let (nav_items, site_settings) =
        futures::join!(state.cms.nav_items(), state.cms.site_settings());

    let nav_items = nav_items.unwrap_or_else(|e| {
        error!(status = e.status(), "error fetching nav items: {e}");
        Vec::new()
    });
    let site_settings = site_settings.unwrap_or_else(|e| {
        error!(status = e.status(), "site settings fetch failed: {e}");
        serde_json::Value::Null
    });

    Json(LayoutData {
        nav_items,
        site_settings,
    })
}

pub async fn home_page_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PageData>, (StatusCode, String)> {
    load_page(&state, HOME_PERMALINK).await
}

pub async fn page_handler(
    State(state): State<Arc<AppState>>,
    Path(permalink): Path<String>,
) -> Result<Json<PageData>, (StatusCode, String)> {
    let permalink = permalink.trim_matches('/');
    let permalink = if permalink.is_empty() {
        HOME_PERMALINK
    } else {
        permalink
    };
    load_page(&state, permalink).await
}

async fn load_page(
    state: &AppState,
    permalink: &str,
) -> Result<Json<PageData>, (StatusCode, String)> {
    load_document(state, collections::PAGES, permalink)
        .await
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("Kunne ikke finne siden du lette etter, som var: \"{permalink}\""),
            )
        })
}

pub async fn conference_handler(
    State(state): State<Arc<AppState>>,
    Path(permalink): Path<String>,
) -> Result<Json<PageData>, (StatusCode, String)> {
    load_document(&state, collections::CONFERENCES, &permalink)
        .await
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("Fant ikke aktuell Nettverkskonferanse: \"{permalink}\""),
            )
        })
}

/// Published document by permalink with rich text post-processed. Any CMS
/// failure is logged and reads as "not found".
async fn load_document(state: &AppState, collection: &str, permalink: &str) -> Option<Json<PageData>> {
    match state.cms.document_by_permalink(collection, permalink).await {
        Ok(Some(mut page)) => {
            process_document(&mut page, state.site_host.as_deref());
            Some(Json(PageData { page }))
        }
        Ok(None) => None,
        Err(e) => {
            error!(collection, permalink, status = e.status(), "error fetching document: {e}");
            None
        }
    }
}

/// Serves CMS assets from the site's own origin.
pub async fn asset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.cms.asset(&id).await {
        Ok(asset) => {
            let content_type = asset
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CACHE_CONTROL, IMMUTABLE_CACHE.to_string()),
                ],
                asset.bytes,
            )
                .into_response()
        }
        Err(e) => {
            error!(id = %id, status = e.status(), "error proxying asset: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load asset").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guarded_turns_panic_into_none() {
        assert_eq!(guarded(async { 7 }).await, Some(7));
        let panicking = async {
            if true {
                panic!("scoring broke");
            }
            0
        };
        assert_eq!(guarded(panicking).await, None);
    }

    #[tokio::test]
    async fn test_panicking_search_becomes_500() {
        let outcome = guarded(async {
            if true {
                panic!("scoring broke");
            }
            SearchOutcome::default()
        })
        .await;
        let (status, Json(body)) = search_response("team", outcome);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.results.is_empty());
        assert_eq!(body.total, 0);
        assert_eq!(body.error.as_deref(), Some("Search failed"));
        assert!(body.query.is_none());
    }

    #[test]
    fn test_successful_search_is_200() {
        let outcome = SearchOutcome {
            query: Some("team".to_string()),
            ..Default::default()
        };
        let (status, Json(body)) = search_response("team", Some(outcome));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.query.as_deref(), Some("team"));
        assert!(body.error.is_none());
    }
}
