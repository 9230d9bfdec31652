//! Record store and job API layer
//!
//! Everything that talks to the external platform lives here: the record
//! model and its wire forms, the store trait with its HTTP and in-memory
//! implementations, job lifecycle reporting, and the resilience helpers the
//! pipeline uses around store calls.

pub mod client;
pub mod jobs;
pub mod memory;
pub mod models;
pub mod resilience;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use client::HttpRecordStore;
pub use jobs::{HttpJobReporter, JobReporter, LogJobReporter, run_job};
pub use memory::InMemoryRecordStore;
pub use models::{FieldUpdate, FieldValue, Record, RecordUpdate, RecordsEnvelope};
pub use resilience::{BackoffStrategy, ContainerGuard, ContainerLocks, LockStats, RetryConfig};
pub use store::{FetchOptions, RecordStore};
