//! Paperfetch: a bibliographic record harvester
//!
//! This crate crawls paginated search backends (the Google Scholar results
//! pages and the Google Custom Search API) for paper titles and URLs,
//! persisting every page to a CSV sink as it lands and deduplicating the
//! whole sink once all sources finish.

pub mod config;
pub mod crawler;
pub mod record;
pub mod source;
pub mod store;

use thiserror::Error;

/// Main error type for paperfetch operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] source::SourceError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown source '{0}' (expected google_scholar, acm, ieee, acl or arxiv)")]
    UnknownSource(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

/// Result type alias for paperfetch operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::JobConfig;
pub use record::Record;
pub use source::{PageCursor, PageResult, SourceId};
