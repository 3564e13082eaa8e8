//! Crawl orchestration across sources
//!
//! Fans one job out to its selected sources, one pagination driver per
//! source, runs them in turn, then deduplicates the sink once globally.

use crate::config::JobConfig;
use crate::crawler::driver::PaginationDriver;
use crate::crawler::Shutdown;
use crate::source::{CustomSearchSource, ScholarSource, SearchSource, SourceId};
use crate::store::RecordStore;
use crate::{ConfigError, HarvestError, Result};
use std::sync::{Arc, Mutex};

/// Runs one crawl job to completion
pub struct Orchestrator<S: RecordStore> {
    job: JobConfig,
    store: Arc<Mutex<S>>,
    shutdown: Shutdown,
    scholar_base_url: Option<String>,
    api_endpoint: Option<String>,
}

impl<S: RecordStore> Orchestrator<S> {
    pub fn new(job: JobConfig, store: S, shutdown: Shutdown) -> Self {
        Self {
            job,
            store: Arc::new(Mutex::new(store)),
            shutdown,
            scholar_base_url: None,
            api_endpoint: None,
        }
    }

    /// Points the scraped backend at a different host. Used by tests to
    /// aim at a mock server.
    pub fn with_scholar_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.scholar_base_url = Some(base_url.into());
        self
    }

    /// Points the API backend at a different endpoint. Used by tests to
    /// aim at a mock server.
    pub fn with_api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = Some(endpoint.into());
        self
    }

    /// Runs every selected source, then deduplicates the sink globally.
    /// Returns the count of unique records left in the sink.
    ///
    /// A source that fails fatally is logged and skipped; its pages
    /// persisted before the failure stay in the sink. A store failure
    /// aborts the whole job.
    pub async fn run(&mut self) -> Result<usize> {
        let sources = self.job.sources.clone();

        for source_id in sources {
            if self.shutdown.is_requested() {
                tracing::info!("Shutdown requested, skipping remaining sources");
                break;
            }

            tracing::info!(source = %source_id, query = %self.job.query, "Starting source");

            let adapter = self.build_adapter(source_id)?;
            let mut driver = PaginationDriver::new(
                adapter,
                Arc::clone(&self.store),
                self.job.max_results,
                self.shutdown.clone(),
            );

            match driver.run(&self.job.query).await {
                Ok(fetched) => {
                    tracing::info!(source = %source_id, fetched, "Source finished");
                }
                // Correctness depends on durable writes; give up on the
                // whole job when the sink cannot be written.
                Err(HarvestError::Store(e)) => {
                    tracing::error!(source = %source_id, "Persistence failed: {}", e);
                    return Err(HarvestError::Store(e));
                }
                Err(e) => {
                    tracing::error!(
                        source = %source_id,
                        "Source failed, prior pages remain persisted: {}",
                        e
                    );
                }
            }
        }

        let mut store = self.store.lock().unwrap();
        let removed = store.deduplicate_and_flush()?;
        let unique = store.len();
        tracing::info!(unique, removed, "Crawl complete");
        Ok(unique)
    }

    /// Builds the adapter matching a source id
    ///
    /// Credentials were checked during job validation, before any network
    /// call; the error paths here guard against construction without it.
    fn build_adapter(&self, source_id: SourceId) -> Result<Box<dyn SearchSource>> {
        match source_id.site_domain() {
            None => {
                let mut scholar = ScholarSource::new()?;
                if let Some(base_url) = &self.scholar_base_url {
                    scholar = scholar.with_base_url(base_url.clone());
                }
                Ok(Box::new(scholar))
            }
            Some(domain) => {
                let api_key = self.job.api_key.as_deref().ok_or_else(|| {
                    ConfigError::MissingCredential(format!(
                        "api-key is required for crawling {}",
                        source_id
                    ))
                })?;
                let cse_id = self.job.cse_id.as_deref().ok_or_else(|| {
                    ConfigError::MissingCredential(format!(
                        "cse-id is required for crawling {}",
                        source_id
                    ))
                })?;

                let mut api = CustomSearchSource::new(source_id, domain, api_key, cse_id)?;
                if let Some(endpoint) = &self.api_endpoint {
                    api = api.with_endpoint(endpoint.clone());
                }
                Ok(Box::new(api))
            }
        }
    }
}
