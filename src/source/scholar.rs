//! Scraped Google Scholar backend
//!
//! Scholar has no API, so this adapter fetches the human search-results
//! pages and extracts records with CSS selectors. The selectors and the
//! results-count heuristic are the fragile part of the whole crate; they
//! are kept here and nowhere else, and every failure degrades to "this
//! source is done" instead of crashing the job.

use crate::record::Record;
use crate::source::{PageCursor, PageResult, SearchSource, SourceError, SourceId};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

/// Browser-like User-Agent; without it Scholar serves a bot wall.
/// Fixed and non-negotiable by callers.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const DEFAULT_BASE_URL: &str = "https://scholar.google.com";

/// Scholar serves 10 results per page.
const PAGE_SIZE: u64 = 10;

/// Inter-page delay bounds in seconds, to respect Scholar's informal rate
/// limits.
const DELAY_BOUNDS: (u64, u64) = (2, 5);

/// Backend adapter for the scraped Scholar results pages
pub struct ScholarSource {
    client: Client,
    base_url: String,
    /// Total result count, learned from the first fetch
    total_results: Option<u64>,
}

impl ScholarSource {
    pub fn new() -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            total_results: None,
        })
    }

    /// Points the adapter at a different host. Used by tests to aim at a
    /// mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches one results page, returning `None` on any HTTP or network
    /// failure. Failures are logged and non-fatal: the caller treats a
    /// missing page as the end of this source.
    async fn get_page(&self, query: &str, start: Option<u64>) -> Option<String> {
        let url = format!("{}/scholar", self.base_url);
        let mut request = self.client.get(&url).query(&[("hl", "en"), ("q", query)]);
        if let Some(start) = start {
            request = request.query(&[("start", start.to_string())]);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::warn!(query, ?start, "Failed to read scholar page body: {}", e);
                    None
                }
            },
            Ok(response) => {
                tracing::warn!(
                    query,
                    ?start,
                    "Failed to fetch scholar page. Status code: {}",
                    response.status()
                );
                None
            }
            Err(e) => {
                tracing::warn!(query, ?start, "Error fetching scholar page: {}", e);
                None
            }
        }
    }

    /// Issues the count request and caches the total, best-effort: any
    /// failure reads as zero results and the source terminates cleanly.
    async fn get_total_results(&mut self, query: &str) -> u64 {
        if let Some(total) = self.total_results {
            return total;
        }

        let total = match self.get_page(query, None).await {
            Some(body) => parse_total_results(&body),
            None => 0,
        };

        if total > 0 {
            tracing::info!(query, total, "Total scholar results found");
        }
        self.total_results = Some(total);
        total
    }
}

#[async_trait]
impl SearchSource for ScholarSource {
    fn id(&self) -> SourceId {
        SourceId::GoogleScholar
    }

    fn initial_cursor(&self) -> PageCursor {
        PageCursor(0)
    }

    fn page_delay(&self) -> Option<(u64, u64)> {
        Some(DELAY_BOUNDS)
    }

    async fn fetch_page(
        &mut self,
        query: &str,
        cursor: PageCursor,
    ) -> Result<PageResult, SourceError> {
        let page = cursor.0;

        let total = self.get_total_results(query).await;
        let max_pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;
        if max_pages == 0 {
            tracing::info!(query, "No scholar results found");
            return Ok(PageResult::end());
        }

        tracing::info!(query, "Fetching scholar page {} of {}", page + 1, max_pages);

        let body = match self.get_page(query, Some(page * PAGE_SIZE)).await {
            Some(body) => body,
            // Non-200 or network failure: this page only, prior pages
            // stay persisted.
            None => return Ok(PageResult::end()),
        };

        let records = parse_results_page(&body);
        for record in &records {
            tracing::debug!(query, title = %record.title, "Fetched paper");
        }

        let next = if page + 1 < max_pages {
            Some(PageCursor(page + 1))
        } else {
            None
        };

        Ok(PageResult { records, next })
    }
}

/// Parses the results-count element (`#gs_ab_md`): second whitespace
/// token with thousands separators stripped, e.g. "About 1,234 results".
/// Absent or unparsable counts read as zero.
fn parse_total_results(html: &str) -> u64 {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("#gs_ab_md") {
        Ok(s) => s,
        Err(_) => return 0,
    };

    let text = match document.select(&selector).next() {
        Some(element) => element.text().collect::<String>(),
        None => {
            tracing::warn!("Results-count element missing from scholar page");
            return 0;
        }
    };

    let raw = text
        .split_whitespace()
        .nth(1)
        .map(|token| token.replace([',', '.'], ""));

    match raw.and_then(|token| token.parse::<u64>().ok()) {
        Some(total) => total,
        None => {
            tracing::warn!(text = %text.trim(), "Could not parse scholar result count");
            0
        }
    }
}

/// Extracts records from one results page: per `div.gs_ri` container, the
/// `h3.gs_rt` title (default "No Title") and its anchor URL when present.
fn parse_results_page(html: &str) -> Vec<Record> {
    let document = Html::parse_document(html);

    let container = match Selector::parse("div.gs_ri") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let title_sel = match Selector::parse("h3.gs_rt") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let anchor_sel = match Selector::parse("h3.gs_rt a") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut records = Vec::new();
    for result in document.select(&container) {
        let title = result
            .select(&title_sel)
            .next()
            .map(|t| strip_bracketed_tags(&t.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "No Title".to_string());

        let url = result
            .select(&anchor_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);

        records.push(Record::new(title, url));
    }

    records
}

/// Removes bracketed tag spans like "[PDF]" or "[HTML]" that Scholar
/// prefixes onto titles, then trims.
fn strip_bracketed_tags(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut depth = 0usize;
    for c in title.chars() {
        match c {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
