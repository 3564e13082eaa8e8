//! Persistence for harvested records
//!
//! This module owns the durable sink. The working set lives in memory and
//! the CSV file on disk is rewritten after every page, so a crash
//! mid-crawl loses at most the in-flight page and never prior pages.

mod csv_store;
mod traits;

pub use csv_store::CsvStore;
pub use traits::{RecordStore, StoreError, StoreResult};
