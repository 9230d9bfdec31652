//! Formatting pipeline orchestration
//!
//! fetch → signatures for the whole batch → per-record diffs → one batch
//! update. Signatures must all be counted before any diff is computed since
//! a row's duplicate status depends on the full-batch count.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::diff::{DiffEngine, StatusMarkers};
use super::fetcher::ResilientFetcher;
use super::signature::{SignatureCounts, signature};
use crate::api::models::{Record, RecordUpdate};
use crate::api::resilience::{ContainerLocks, RetryConfig};
use crate::api::store::{FetchOptions, RecordStore};
use crate::config::Config;

/// Updates computed for one batch, before submission
#[derive(Debug, Clone, Default)]
pub struct FormattingPlan {
    pub records_fetched: usize,
    pub updates: Vec<RecordUpdate>,
    pub duplicate_rows: usize,
    pub duplicate_groups: usize,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub container_id: String,
    pub records_fetched: usize,
    pub updates_submitted: usize,
    pub fields_changed: usize,
    pub duplicate_rows: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// One-line outcome message, used for job completion
    pub fn summary(&self) -> String {
        if self.records_fetched == 0 {
            return format!("No records found in {}", self.container_id);
        }
        format!(
            "Formatted {} of {} records ({} fields changed, {} duplicate rows)",
            self.updates_submitted, self.records_fetched, self.fields_changed, self.duplicate_rows
        )
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in {}ms", self.summary(), self.elapsed_ms())
    }
}

pub struct FormattingPipeline {
    store: Arc<dyn RecordStore>,
    retry: RetryConfig,
    fetch_options: FetchOptions,
    engine: DiffEngine,
    locks: ContainerLocks,
}

impl FormattingPipeline {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            retry: RetryConfig::default(),
            fetch_options: FetchOptions::default(),
            engine: DiffEngine::default(),
            locks: ContainerLocks::new(),
        }
    }

    pub fn from_config(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self::new(store)
            .with_retry(config.retry.to_retry_config())
            .with_markers(config.markers.clone())
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_markers(mut self, markers: StatusMarkers) -> Self {
        self.engine = DiffEngine::new(markers);
        self
    }

    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Share run serialization with other pipelines
    pub fn with_locks(mut self, locks: ContainerLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Compute the updates for a batch of records
    pub fn plan_records(&self, records: &[Record]) -> FormattingPlan {
        let signatures: Vec<String> = records
            .iter()
            .map(|record| signature(&self.engine.canonical_fields(record)))
            .collect();
        let counts: SignatureCounts = signatures.iter().collect();

        let updates: Vec<RecordUpdate> = records
            .iter()
            .zip(&signatures)
            .filter_map(|(record, sig)| self.engine.diff(record, sig, counts.count(sig)))
            .collect();

        FormattingPlan {
            records_fetched: records.len(),
            updates,
            duplicate_rows: counts.duplicate_rows(),
            duplicate_groups: counts.duplicate_groups(),
        }
    }

    /// Fetch a container and compute its updates without submitting them
    pub async fn plan(&self, container_id: &str) -> FormattingPlan {
        let records = ResilientFetcher::new(self.store.as_ref(), &self.retry)
            .with_options(self.fetch_options)
            .fetch_all(container_id)
            .await;

        if records.is_empty() {
            return FormattingPlan::default();
        }
        self.plan_records(&records)
    }

    /// Bring every record in the container to its canonical form
    ///
    /// Only a rejected batch update is an error; an empty container or a
    /// batch that is already canonical completes without touching the store.
    pub async fn run_formatting(&self, container_id: &str) -> Result<RunReport> {
        let _guard = self.locks.acquire(container_id).await;
        let started_at = Utc::now();

        let plan = self.plan(container_id).await;
        if plan.records_fetched == 0 {
            log::info!("Nothing to format in '{}'", container_id);
        } else if plan.updates.is_empty() {
            log::info!(
                "All {} records in '{}' are already formatted",
                plan.records_fetched,
                container_id
            );
        } else {
            log::info!(
                "Submitting {} record updates to '{}' ({} duplicate rows in {} groups)",
                plan.updates.len(),
                container_id,
                plan.duplicate_rows,
                plan.duplicate_groups
            );
            self.store
                .batch_update(container_id, &plan.updates)
                .await
                .with_context(|| {
                    format!(
                        "Failed to update {} records in '{}'",
                        plan.updates.len(),
                        container_id
                    )
                })?;
        }

        let report = RunReport {
            container_id: container_id.to_string(),
            records_fetched: plan.records_fetched,
            updates_submitted: plan.updates.len(),
            fields_changed: plan.updates.iter().map(RecordUpdate::len).sum(),
            duplicate_rows: plan.duplicate_rows,
            started_at,
            finished_at: Utc::now(),
        };
        log::info!("{}", report);
        Ok(report)
    }
}
