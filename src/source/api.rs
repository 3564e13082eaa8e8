//! Google Custom Search API backend
//!
//! The publisher databases (ACM, IEEE, ACL Anthology, arXiv) are reached
//! through one Custom Search engine with a `site:` restriction per source.
//! The API returns at most 10 items per call and tells us the next start
//! index when there are more.

use crate::record::Record;
use crate::source::{PageCursor, PageResult, SearchSource, SourceError, SourceId};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://customsearch.googleapis.com/customsearch/v1";

/// Backend adapter for one `site:`-restricted Custom Search source
pub struct CustomSearchSource {
    client: Client,
    endpoint: String,
    source: SourceId,
    domain: String,
    api_key: String,
    cse_id: String,
}

impl CustomSearchSource {
    /// Builds an adapter for `source`, restricted to `domain`.
    ///
    /// Credentials are already validated by the time an adapter is built;
    /// the orchestrator never constructs one without them.
    pub fn new(
        source: SourceId,
        domain: impl Into<String>,
        api_key: impl Into<String>,
        cse_id: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            source,
            domain: domain.into(),
            api_key: api_key.into(),
            cse_id: cse_id.into(),
        })
    }

    /// Points the adapter at a different endpoint. Used by tests to aim at
    /// a mock server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchSource for CustomSearchSource {
    fn id(&self) -> SourceId {
        self.source
    }

    // Custom Search pagination is 1-based.
    fn initial_cursor(&self) -> PageCursor {
        PageCursor(1)
    }

    async fn fetch_page(
        &mut self,
        query: &str,
        cursor: PageCursor,
    ) -> Result<PageResult, SourceError> {
        let site_query = format!("site:{} {}", self.domain, query);
        tracing::info!(
            source = %self.source,
            query = %site_query,
            start = cursor.0,
            "Querying Custom Search API"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", site_query.as_str()),
                ("start", cursor.0.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Http {
                source_id: self.source,
                cursor: cursor.0,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                source_id: self.source,
                cursor: cursor.0,
                message: format!("status {}", status),
            });
        }

        let body: SearchResponse =
            response.json().await.map_err(|e| SourceError::Malformed {
                source_id: self.source,
                cursor: cursor.0,
                message: e.to_string(),
            })?;

        Ok(page_from_response(body))
    }
}

/// Subset of the Custom Search response we consume
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    #[serde(default)]
    queries: Queries,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Queries {
    #[serde(rename = "nextPage", default)]
    next_page: Vec<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    #[serde(rename = "startIndex")]
    start_index: u64,
}

fn page_from_response(body: SearchResponse) -> PageResult {
    let records = body
        .items
        .into_iter()
        .map(|item| {
            let title = item.title.unwrap_or_default();
            tracing::debug!(title = %title, "Found result");
            Record::new(title, item.link)
        })
        .collect();

    let next = body
        .queries
        .next_page
        .first()
        .map(|p| PageCursor(p.start_index));

    PageResult { records, next }
}
