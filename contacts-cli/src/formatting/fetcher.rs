//! Bounded-retry record fetch
//!
//! Freshly imported rows may not be readable right away, so an empty result
//! is retried just like a failed call. The first attempt that yields records
//! wins; running out of attempts yields an empty batch rather than an error.

use log::{debug, info, warn};

use crate::api::models::Record;
use crate::api::resilience::RetryConfig;
use crate::api::store::{FetchOptions, RecordStore};

pub struct ResilientFetcher<'a> {
    store: &'a dyn RecordStore,
    retry: &'a RetryConfig,
    options: FetchOptions,
}

impl<'a> ResilientFetcher<'a> {
    pub fn new(store: &'a dyn RecordStore, retry: &'a RetryConfig) -> Self {
        Self {
            store,
            retry,
            options: FetchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Fetch all records of a container, retrying failures and empty results
    pub async fn fetch_all(&self, container_id: &str) -> Vec<Record> {
        let attempts = self.retry.attempts();

        for attempt in 1..=attempts {
            match self.store.fetch(container_id, &self.options).await {
                Ok(records) if !records.is_empty() => {
                    debug!(
                        "Fetched {} records from '{}' on attempt {}/{}",
                        records.len(),
                        container_id,
                        attempt,
                        attempts
                    );
                    return records;
                }
                Ok(_) => {
                    debug!(
                        "No records in '{}' yet (attempt {}/{})",
                        container_id, attempt, attempts
                    );
                }
                Err(err) => {
                    warn!(
                        "Fetching records from '{}' failed (attempt {}/{}): {:#}",
                        container_id, attempt, attempts, err
                    );
                }
            }

            if attempt < attempts {
                let delay = self.retry.delay_for_attempt(attempt);
                debug!("Retrying '{}' in {:?}", container_id, delay);
                tokio::time::sleep(delay).await;
            }
        }

        info!(
            "No records found in '{}' after {} attempts",
            container_id, attempts
        );
        Vec::new()
    }
}
