//! Record store interface consumed by the formatting pipeline

use async_trait::async_trait;

use super::models::{Record, RecordUpdate};

/// Options for a record fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Ask the store to include validation messages and other field metadata
    pub include_annotations: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            include_annotations: true,
        }
    }
}

/// External storage for contact records, addressed by container id
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records currently in the container, in store order
    async fn fetch(&self, container_id: &str, options: &FetchOptions) -> anyhow::Result<Vec<Record>>;

    /// Apply a set of record updates in a single call
    async fn batch_update(&self, container_id: &str, updates: &[RecordUpdate]) -> anyhow::Result<()>;
}
