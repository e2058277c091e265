//! Content-source API client and block tree fetcher.
//!
//! The fetcher retrieves a page's block list through cursor-based pagination
//! and expands nested children in place before returning. Expansion walks an
//! explicit frontier work-list instead of the native call stack, so source
//! trees of arbitrary depth cannot exhaust it.

use chrono::Utc;
use log::{debug, error, info};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::model::{Block, Page, PropertyValue};

/// Children requested per pagination round.
const PAGE_SIZE: u32 = 100;

const API_VERSION: &str = "2022-06-28";
const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";

/// One page of block children.
///
/// The cursor is scoped to a single parent and consumed sequentially; it is
/// never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockChildren {
    #[serde(default)]
    pub results: Vec<Block>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// One page of database query results.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResults {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Seam over the paginated children endpoint, so the fetch logic can be
/// exercised against an in-memory source in tests.
pub trait BlockSource {
    /// Fetch one page of direct children of `block_id`.
    fn block_children(&self, block_id: &str, cursor: Option<&str>) -> Result<BlockChildren>;
}

/// Fetch the complete ordered list of direct children of `block_id`,
/// following cursors until the source reports no more pages or returns an
/// empty page.
pub fn fetch_children(source: &dyn BlockSource, block_id: &str) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = source.block_children(block_id, cursor.as_deref())?;
        if page.results.is_empty() {
            return Ok(blocks);
        }
        blocks.extend(page.results);
        if !page.has_more {
            return Ok(blocks);
        }
        cursor = page.next_cursor;
    }
}

/// Fetch the full block tree rooted at `root_id`: every child that declares
/// nested children is expanded in place before this returns.
///
/// Any transport or pagination error aborts the whole tree fetch; the caller
/// decides whether to skip the page.
pub fn fetch_tree(source: &dyn BlockSource, root_id: &str) -> Result<Vec<Block>> {
    let mut blocks = fetch_children(source, root_id)?;

    let mut frontier: Vec<&mut Block> = blocks
        .iter_mut()
        .filter(|b| b.has_children && b.kind().supports_children())
        .collect();

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for block in frontier {
            debug!("expanding children of block {}", block.id);
            block.children = fetch_children(source, &block.id)?;
            next.extend(
                block
                    .children
                    .iter_mut()
                    .filter(|c| c.has_children && c.kind().supports_children()),
            );
        }
        frontier = next;
    }

    Ok(blocks)
}

/// Blocking HTTP client for the content-source API.
pub struct NotionClient {
    http: reqwest::blocking::Client,
    token: String,
    base_url: String,
}

impl NotionClient {
    /// Create a client authenticating with the given integration token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root. Used in tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn send<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> Result<T> {
        let resp = req
            .bearer_auth(&self.token)
            .header("Notion-Version", API_VERSION)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json()?)
    }

    /// Query a database for pages matching the configured select filter.
    pub fn query_database(
        &self,
        database_id: &str,
        filter_prop: &str,
        filter_values: &[String],
    ) -> Result<QueryResults> {
        let mut body = json!({ "page_size": PAGE_SIZE });
        if !filter_prop.is_empty() && !filter_values.is_empty() {
            let clauses: Vec<_> = filter_values
                .iter()
                .map(|v| {
                    json!({
                        "property": filter_prop,
                        "select": { "equals": v }
                    })
                })
                .collect();
            body["filter"] = json!({ "or": clauses });
        }

        let url = format!("{}/databases/{}/query", self.base_url, database_id);
        self.send(self.http.post(url).json(&body))
    }

    /// Advance a page's filter property to the published value and stamp the
    /// publish date. Returns `true` if the status actually changed.
    ///
    /// Fire-and-forget relative to rendering: failures are logged, never
    /// propagated.
    pub fn publish(&self, page: &Page, filter_prop: &str, published_value: &str) -> bool {
        if filter_prop.is_empty() || published_value.is_empty() {
            return false;
        }

        // Skip pages already published, or without the filter property at all.
        match page.property(filter_prop) {
            Some(PropertyValue::Select { select }) => {
                if select.as_ref().is_some_and(|s| s.name == published_value) {
                    return false;
                }
            }
            _ => return false,
        }

        let body = json!({
            "properties": {
                filter_prop: { "select": { "name": published_value } },
                "PublishDate": { "date": { "start": Utc::now().to_rfc3339() } }
            }
        });

        let url = format!("{}/pages/{}", self.base_url, page.id);
        match self.send::<serde_json::Value>(self.http.patch(url).json(&body)) {
            Ok(_) => {
                info!("page {} marked as {}", page.id, published_value);
                true
            }
            Err(err) => {
                error!("error changing status of page {}: {}", page.id, err);
                false
            }
        }
    }
}

impl BlockSource for NotionClient {
    fn block_children(&self, block_id: &str, cursor: Option<&str>) -> Result<BlockChildren> {
        let url = format!("{}/blocks/{}/children", self.base_url, block_id);
        let mut req = self
            .http
            .get(url)
            .query(&[("page_size", PAGE_SIZE.to_string())]);
        if let Some(cursor) = cursor {
            req = req.query(&[("start_cursor", cursor)]);
        }
        self.send(req)
    }
}
