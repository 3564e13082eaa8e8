//! Search backends for paperfetch
//!
//! Each backend implements the [`SearchSource`] capability: fetch one page
//! of results for a query and a cursor. All structure-dependent extraction
//! (HTML selectors, JSON shapes) lives behind this trait, so a layout
//! change in a backend touches exactly one file and degrades instead of
//! propagating.

mod api;
mod scholar;

pub use api::CustomSearchSource;
pub use scholar::ScholarSource;

use crate::record::Record;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of one crawlable source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    GoogleScholar,
    Acm,
    Ieee,
    Acl,
    Arxiv,
}

impl SourceId {
    /// Publisher domain used for `site:` restriction, for the API-backed
    /// sources. The scraped scholar source has no site restriction.
    pub fn site_domain(&self) -> Option<&'static str> {
        match self {
            Self::GoogleScholar => None,
            Self::Acm => Some("dl.acm.org"),
            Self::Ieee => Some("ieeexplore.ieee.org"),
            Self::Acl => Some("aclanthology.org"),
            Self::Arxiv => Some("arxiv.org"),
        }
    }

    /// Whether this source goes through the Custom Search API
    pub fn is_api_backed(&self) -> bool {
        self.site_domain().is_some()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GoogleScholar => "google_scholar",
            Self::Acm => "acm",
            Self::Ieee => "ieee",
            Self::Acl => "acl",
            Self::Arxiv => "arxiv",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SourceId {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google_scholar" => Ok(Self::GoogleScholar),
            "acm" => Ok(Self::Acm),
            "ieee" => Ok(Self::Ieee),
            "acl" => Ok(Self::Acl),
            "arxiv" => Ok(Self::Arxiv),
            other => Err(crate::ConfigError::UnknownSource(other.to_string())),
        }
    }
}

/// Opaque pagination cursor
///
/// The driver only threads cursors through; each backend decides what the
/// value means (zero-based page index for scholar, 1-based start index for
/// the Custom Search API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor(pub u64);

/// One page of fetched results plus the continuation, if any
#[derive(Debug, Clone)]
pub struct PageResult {
    pub records: Vec<Record>,
    pub next: Option<PageCursor>,
}

impl PageResult {
    /// A page with no records and no continuation; ends the source.
    pub fn end() -> Self {
        Self {
            records: Vec::new(),
            next: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// Errors surfaced by a backend during a page fetch
///
/// Every variant carries the source and cursor so a recovered error can be
/// reproduced from the log line alone.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error from {source_id} at cursor {cursor}: {message}")]
    Http {
        source_id: SourceId,
        cursor: u64,
        message: String,
    },

    #[error("Malformed response from {source_id} at cursor {cursor}: {message}")]
    Malformed {
        source_id: SourceId,
        cursor: u64,
        message: String,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Capability shared by all backends: fetch one page of results
///
/// Adapters may keep per-crawl state between calls (the scholar adapter
/// caches the total-results count learned on the first fetch), so
/// `fetch_page` takes `&mut self`. No state is shared between adapter
/// instances.
#[async_trait]
pub trait SearchSource: Send {
    /// Which source this adapter crawls
    fn id(&self) -> SourceId;

    /// Cursor for the first page of this backend
    fn initial_cursor(&self) -> PageCursor;

    /// Inter-page delay bounds in whole seconds, when the backend asks to
    /// be throttled. Sanctioned APIs return `None` and paginate without
    /// artificial delay.
    fn page_delay(&self) -> Option<(u64, u64)> {
        None
    }

    /// Fetches one page of results for `query` at `cursor`
    async fn fetch_page(
        &mut self,
        query: &str,
        cursor: PageCursor,
    ) -> Result<PageResult, SourceError>;
}
