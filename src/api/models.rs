use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data_models::Document;
use crate::search::{SearchHit, SearchOutcome};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn failed(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Default::default()
        }
    }
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            results: outcome.results,
            total: outcome.total,
            query: outcome.query,
            error: None,
        }
    }
}

/// Data for the search page. `query` is always present, trimmed for display.
#[derive(Debug, Serialize, Default)]
pub struct SearchPageData {
    pub results: Vec<SearchHit>,
    pub total: usize,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutData {
    pub nav_items: Vec<Value>,
    pub site_settings: Value,
}

#[derive(Debug, Serialize)]
pub struct PageData {
    pub page: Document,
}
