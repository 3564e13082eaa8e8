//! The harvested record type shared by sources and the store.

use serde::{Deserialize, Serialize};

/// One harvested paper: a title and, when the backend exposed one, a URL.
///
/// Dedup identity is the title alone; two records with the same title but
/// different URLs collapse to the first one seen. This mirrors the sink
/// format, so the `csv` crate can round-trip it (a record without a URL
/// serializes as an empty field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    pub url: Option<String>,
}

impl Record {
    pub fn new(title: impl Into<String>, url: Option<String>) -> Self {
        Self {
            title: title.into(),
            url,
        }
    }
}
