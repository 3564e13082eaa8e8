//! Pagination driver
//!
//! This is the control loop shared by every backend: fetch a page at the
//! current cursor, truncate to the remaining result budget, persist, then
//! either follow the continuation or stop. The driver never interprets a
//! cursor; it only threads the value the adapter handed back.

use crate::crawler::Shutdown;
use crate::source::SearchSource;
use crate::store::RecordStore;
use crate::Result;
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Drives one backend adapter to completion
///
/// Invariants held here:
/// - the sink reflects every fetched page before the next fetch starts
/// - the number of records appended never exceeds the result cap
pub struct PaginationDriver<S: RecordStore> {
    source: Box<dyn SearchSource>,
    store: Arc<Mutex<S>>,
    result_cap: Option<u64>,
    shutdown: Shutdown,
}

impl<S: RecordStore> PaginationDriver<S> {
    pub fn new(
        source: Box<dyn SearchSource>,
        store: Arc<Mutex<S>>,
        result_cap: Option<u64>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            source,
            store,
            result_cap,
            shutdown,
        }
    }

    /// Runs the source to completion and returns how many records were
    /// appended for it.
    ///
    /// A store failure or an adapter error propagates to the caller; the
    /// pages persisted before it stay on disk either way.
    pub async fn run(&mut self, query: &str) -> Result<u64> {
        let source_id = self.source.id();
        let mut cursor = self.source.initial_cursor();
        let mut fetched: u64 = 0;

        loop {
            let page = match self.source.fetch_page(query, cursor).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!(
                        source = %source_id,
                        query,
                        cursor = cursor.0,
                        "Page fetch failed: {}",
                        e
                    );
                    return Err(e.into());
                }
            };

            let next = page.next;
            let mut records = page.records;

            // Truncate mid-page so the cap holds even when a page would
            // straddle it.
            if let Some(cap) = self.result_cap {
                let remaining = cap.saturating_sub(fetched) as usize;
                if records.len() > remaining {
                    records.truncate(remaining);
                }
            }
            fetched += records.len() as u64;

            // Persist before anything else looks at the continuation; an
            // empty page is still a successful transition.
            {
                let mut store = self.store.lock().unwrap();
                store.append_and_flush(records)?;
            }

            let next_cursor = match next {
                Some(c) => c,
                None => {
                    tracing::debug!(source = %source_id, "Continuation exhausted");
                    break;
                }
            };

            if self.result_cap.is_some_and(|cap| fetched >= cap) {
                tracing::info!(source = %source_id, fetched, "Result cap reached");
                break;
            }

            if self.shutdown.is_requested() {
                tracing::info!(
                    source = %source_id,
                    "Shutdown requested, stopping after persisted page"
                );
                break;
            }

            if let Some((min, max)) = self.source.page_delay() {
                let secs = rand::thread_rng().gen_range(min as f64..max as f64);
                tokio::time::sleep(Duration::from_secs_f64(secs)).await;
            }

            cursor = next_cursor;
        }

        tracing::info!(source = %source_id, fetched, "Source complete");
        Ok(fetched)
    }
}
