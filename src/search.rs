use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::analyzer::{fold_case, fold_char, plain_text};
use crate::cms::{CmsClient, collections};
use crate::data_models::Document;

/// Queries shorter than this (after trimming, in chars) return nothing.
pub const MIN_QUERY_LEN: usize = 2;
/// Documents requested per collection.
pub const FETCH_LIMIT: usize = 50;
/// Results returned to the caller; `total` counts everything that matched.
pub const MAX_RESULTS: usize = 20;

const EXCERPT_CONTEXT: usize = 75;
const EXCERPT_FALLBACK_LEN: usize = 150;
const ELLIPSIS: &str = "...";

/// How a document permalink becomes a site URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlRule {
    /// `/{permalink}`, with the `home` permalink mapped to `/`.
    Root { home: &'static str },
    /// `{prefix}{permalink}`.
    Prefixed(&'static str),
}

impl UrlRule {
    pub fn url_for(&self, permalink: &str) -> String {
        match self {
            UrlRule::Root { home } if permalink == *home => "/".to_string(),
            UrlRule::Root { .. } => format!("/{permalink}"),
            UrlRule::Prefixed(prefix) => format!("{prefix}{permalink}"),
        }
    }
}

/// One searchable CMS collection. Adding a collection to search means adding
/// an entry here, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentSource {
    pub collection: &'static str,
    /// Value of `type` on results from this collection.
    pub tag: &'static str,
    pub url_rule: UrlRule,
}

pub fn default_sources() -> Vec<ContentSource> {
    vec![
        ContentSource {
            collection: collections::PAGES,
            tag: "page",
            url_rule: UrlRule::Root { home: "home" },
        },
        ContentSource {
            collection: collections::CONFERENCES,
            tag: "nettverkskonferanse",
            url_rule: UrlRule::Prefixed("/nettverkskonferanser/"),
        },
    ]
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: Value,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub excerpt: String,
    pub relevance: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub results: Vec<SearchHit>,
    /// Matches before truncation to [`MAX_RESULTS`].
    pub total: usize,
    /// The query as received. `None` when the query was too short to run.
    pub query: Option<String>,
}

pub struct SearchEngine {
    cms: CmsClient,
    sources: Vec<ContentSource>,
}

impl SearchEngine {
    pub fn new(cms: CmsClient, sources: Vec<ContentSource>) -> Self {
        Self { cms, sources }
    }

    pub fn with_default_sources(cms: CmsClient) -> Self {
        Self::new(cms, default_sources())
    }

    pub async fn search(&self, query: &str) -> SearchOutcome {
        if !is_searchable(query) {
            return SearchOutcome::default();
        }

        // Fetched concurrently, merged in registry order so ties keep
        // collection order then fetch order.
        let per_source = join_all(
            self.sources
                .iter()
                .map(|source| self.search_source(source, query)),
        )
        .await;

        let mut results: Vec<SearchHit> = per_source.into_iter().flatten().collect();
        // stable: equal relevance keeps discovery order
        results.sort_by(|a, b| b.relevance.cmp(&a.relevance));

        let total = results.len();
        results.truncate(MAX_RESULTS);
        debug!(total, returned = results.len(), "search finished");

        SearchOutcome {
            results,
            total,
            query: Some(query.to_string()),
        }
    }

    /// Matches from a single collection. A failing collection contributes nothing.
    async fn search_source(&self, source: &ContentSource, query: &str) -> Vec<SearchHit> {
        match self
            .cms
            .published_documents(source.collection, FETCH_LIMIT)
            .await
        {
            Ok(documents) => documents
                .iter()
                .filter_map(|doc| match_document(doc, source, query))
                .collect(),
            Err(e) => {
                error!(
                    collection = source.collection,
                    status = e.status(),
                    "search fetch failed: {e}"
                );
                Vec::new()
            }
        }
    }
}

pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_LEN
}

/// Scores `doc` against `query`, or `None` if neither title nor block text contains it.
pub fn match_document(doc: &Document, source: &ContentSource, query: &str) -> Option<SearchHit> {
    let needle = fold_case(query);
    let title = doc.title.as_deref().unwrap_or("");
    let content = doc.block_text();

    let title_match = fold_case(title).contains(&needle);
    let content_match = fold_case(&content).contains(&needle);
    if !title_match && !content_match {
        return None;
    }

    Some(SearchHit {
        id: doc.id.clone(),
        title: doc.title.clone(),
        kind: source.tag.to_string(),
        url: source
            .url_rule
            .url_for(doc.permalink.as_deref().unwrap_or("")),
        excerpt: extract_excerpt(&content, query),
        relevance: calculate_relevance(title, &content, query),
    })
}

/// Plain-text snippet around the first occurrence of `query`, or the start of
/// the text when it does not occur.
pub fn extract_excerpt(content: &str, query: &str) -> String {
    let text: Vec<char> = plain_text(content).chars().collect();
    let folded: Vec<char> = text.iter().copied().map(fold_char).collect();
    let needle: Vec<char> = fold_case(query).chars().collect();

    let Some(index) = find_chars(&folded, &needle) else {
        let mut excerpt: String = text.iter().take(EXCERPT_FALLBACK_LEN).collect();
        if text.len() > EXCERPT_FALLBACK_LEN {
            excerpt.push_str(ELLIPSIS);
        }
        return excerpt;
    };

    let start = index.saturating_sub(EXCERPT_CONTEXT);
    let end = text.len().min(index + needle.len() + EXCERPT_CONTEXT);

    let mut excerpt = String::new();
    if start > 0 {
        excerpt.push_str(ELLIPSIS);
    }
    excerpt.extend(&text[start..end]);
    if end < text.len() {
        excerpt.push_str(ELLIPSIS);
    }
    excerpt
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Title hits dominate: +10 contains, +20 exact, +10 prefix. Each content
/// occurrence adds 2.
pub fn calculate_relevance(title: &str, content: &str, query: &str) -> u32 {
    let query = fold_case(query);
    let title = fold_case(title);
    let content = fold_case(content);

    let mut score = 0;
    if title.contains(&query) {
        score += 10;
        if title == query {
            score += 20;
        }
        if title.starts_with(&query) {
            score += 10;
        }
    }

    score + 2 * count_occurrences(&content, &query) as u32
}

/// Non-overlapping, left-to-right literal occurrences of `needle`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

#[test]
fn test_url_rules() {
    let root = UrlRule::Root { home: "home" };
    assert_eq!(root.url_for("home"), "/");
    assert_eq!(root.url_for("om-oss"), "/om-oss");
    assert_eq!(root.url_for(""), "/");

    let conf = UrlRule::Prefixed("/nettverkskonferanser/");
    assert_eq!(conf.url_for("home"), "/nettverkskonferanser/home");
    assert_eq!(conf.url_for("vest-2025"), "/nettverkskonferanser/vest-2025");
}

#[test]
fn test_is_searchable() {
    assert!(!is_searchable(""));
    assert!(!is_searchable("a"));
    assert!(!is_searchable("  b \t"));
    assert!(!is_searchable("ø"));
    assert!(is_searchable("øy"));
    assert!(is_searchable(" ab "));
}
