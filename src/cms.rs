use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::data_models::{Document, ItemsResponse};
use crate::error::CmsError;

/// Collection names as constants for consistency
pub mod collections {
    pub const PAGES: &str = "pages";
    pub const CONFERENCES: &str = "nettverkskonferanser";
    pub const NAV_ITEMS: &str = "nav_item";
    pub const SITE_SETTINGS: &str = "site_settings";
}

/// Field selection that expands blocks and the items of every block type.
pub const DOCUMENT_FIELDS: &str = "*,blocks.*,blocks.item:block_richtext.*,blocks.item:block_herowithimage.*,blocks.item:block_teammember.*";
pub const NAV_ITEM_FIELDS: &str = "*,page_href.permalink,nettverkskonferanse_href.permalink";
pub const PUBLISHED: &str = "published";

/// Raw asset bytes as served by the CMS.
#[derive(Debug)]
pub struct Asset {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Read-only client for the Directus REST API.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: Client,
    base_url: String,
    token: String,
}

impl CmsClient {
    pub fn new(config: &Config) -> Result<Self, CmsError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.directus_url.clone(),
            token: config.directus_token.clone(),
        })
    }

    /// GET `/items/{collection}` and unwrap the `data` envelope.
    pub async fn items<T>(&self, collection: &str, params: &[(&str, &str)]) -> Result<T, CmsError>
    where
        T: DeserializeOwned + Default,
    {
        let url = format!("{}/items/{}", self.base_url, collection);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CmsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ItemsResponse<T> = response.json().await?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Published documents of a collection, blocks expanded. Records that are
    /// not objects are skipped.
    pub async fn published_documents(
        &self,
        collection: &str,
        limit: usize,
    ) -> Result<Vec<Document>, CmsError> {
        let limit = limit.to_string();
        let records: Vec<Value> = self
            .items(
                collection,
                &[
                    ("filter[status][_eq]", PUBLISHED),
                    ("fields", DOCUMENT_FIELDS),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;

        Ok(records
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    debug!(collection, "skipping unreadable record: {e}");
                    None
                }
            })
            .collect())
    }

    /// The published document with the given permalink, if any.
    pub async fn document_by_permalink(
        &self,
        collection: &str,
        permalink: &str,
    ) -> Result<Option<Document>, CmsError> {
        let docs: Vec<Document> = self
            .items(
                collection,
                &[
                    ("filter[permalink][_eq]", permalink),
                    ("filter[status][_eq]", PUBLISHED),
                    ("fields", DOCUMENT_FIELDS),
                ],
            )
            .await?;
        Ok(docs.into_iter().next())
    }

    pub async fn nav_items(&self) -> Result<Vec<Value>, CmsError> {
        self.items(
            collections::NAV_ITEMS,
            &[("fields", NAV_ITEM_FIELDS), ("sort", "sort")],
        )
        .await
    }

    pub async fn site_settings(&self) -> Result<Value, CmsError> {
        self.items(collections::SITE_SETTINGS, &[("limit", "1"), ("fields", "*")])
            .await
    }

    /// Fetch a file from `/assets/{id}`. Assets are public, no credentials are sent.
    pub async fn asset(&self, id: &str) -> Result<Asset, CmsError> {
        let url = format!("{}/assets/{}", self.base_url, id);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CmsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        Ok(Asset {
            content_type,
            bytes,
        })
    }
}
