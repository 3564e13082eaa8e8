use crate::source::SourceId;
use serde::Deserialize;
use std::path::PathBuf;

/// A validated crawl job: one query fanned out to a set of sources.
///
/// Loaded from a TOML file, optionally overridden field-by-field from the
/// command line, and immutable once the crawl starts.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// The query to search papers with
    pub query: String,

    /// The sources to fetch papers from
    pub sources: Vec<SourceId>,

    /// Cap on records fetched per source; absent means unbounded
    #[serde(rename = "max-results")]
    pub max_results: Option<u64>,

    /// Path of the CSV sink
    #[serde(rename = "csv-file", default = "default_csv_file")]
    pub csv_file: PathBuf,

    /// Path of the diagnostics log file
    #[serde(rename = "log-file", default = "default_log_file")]
    pub log_file: PathBuf,

    /// Google Custom Search API key, required by the API-backed sources
    #[serde(rename = "api-key")]
    pub api_key: Option<String>,

    /// Google Custom Search engine id, required by the API-backed sources
    #[serde(rename = "cse-id")]
    pub cse_id: Option<String>,
}

fn default_csv_file() -> PathBuf {
    PathBuf::from("data/papers.csv")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("data/crawler.log")
}

impl JobConfig {
    /// Whether any selected source goes through the Custom Search API
    pub fn needs_api_credentials(&self) -> bool {
        self.sources.iter().any(|s| s.is_api_backed())
    }
}
