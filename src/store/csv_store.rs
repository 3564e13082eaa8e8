//! CSV-file record store
//!
//! The sink is a UTF-8 CSV file with a `title,url` header. Crawl volumes
//! are small, so every append rewrites the whole file; the rewrite goes
//! through a sibling temp file and an atomic rename, which is what keeps
//! a crash from ever leaving partial rows behind.

use crate::record::Record;
use crate::store::traits::{RecordStore, StoreResult};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Record store over a single CSV file
pub struct CsvStore {
    path: PathBuf,
    records: Vec<Record>,
}

impl CsvStore {
    /// Opens the sink at `path`, loading any previously persisted records.
    /// A missing file is an empty store, not an error.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let records = load_records(&path)?;
        if !records.is_empty() {
            tracing::info!(
                count = records.len(),
                path = %path.display(),
                "Loaded previously persisted records"
            );
        }
        Ok(Self { path, records })
    }

    /// Path of the underlying sink file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrites the sink from the in-memory working set: temp file,
    /// flush, fsync, rename.
    fn rewrite(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut writer = csv::Writer::from_path(&tmp_path)?;
        // serialize() only emits the header alongside the first row, so an
        // empty working set needs it written explicitly.
        if self.records.is_empty() {
            writer.write_record(["title", "url"])?;
        }
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl RecordStore for CsvStore {
    fn records(&self) -> &[Record] {
        &self.records
    }

    fn append_and_flush(&mut self, new_records: Vec<Record>) -> StoreResult<()> {
        self.records.extend(new_records);
        self.rewrite()?;
        tracing::debug!(
            total = self.records.len(),
            path = %self.path.display(),
            "Saved records"
        );
        Ok(())
    }

    fn deduplicate_and_flush(&mut self) -> StoreResult<usize> {
        let before = self.records.len();
        let mut seen = HashSet::new();
        self.records.retain(|r| seen.insert(r.title.clone()));
        let removed = before - self.records.len();
        self.rewrite()?;
        tracing::info!(removed, "Removed duplicate papers");
        Ok(removed)
    }
}

/// Reads all records from `path`; a missing file yields an empty set.
fn load_records(path: &Path) -> StoreResult<Vec<Record>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Sink does not exist yet");
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
