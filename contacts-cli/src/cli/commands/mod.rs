//! Command handlers

pub mod job;
pub mod records;
pub mod run;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::api::{HttpRecordStore, InMemoryRecordStore, RecordStore};
use crate::config::Config;

/// A local record file when one is given, the configured API otherwise
pub(crate) async fn open_store(file: Option<&Path>, config: &Config) -> Result<Arc<dyn RecordStore>> {
    match file {
        Some(path) => {
            log::debug!("Using local record file {}", path.display());
            Ok(Arc::new(InMemoryRecordStore::open(path).await?))
        }
        None => {
            log::debug!("Using record store at {}", config.store.base_url);
            Ok(Arc::new(HttpRecordStore::new(&config.store)?))
        }
    }
}
