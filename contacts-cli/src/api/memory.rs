//! In-memory record store with optional JSON file persistence
//!
//! Backs the CLI's offline mode (`--file`) and the pipeline tests. The file
//! holds a JSON object mapping container id to its record list.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::models::{Record, RecordUpdate};
use super::store::{FetchOptions, RecordStore};

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    containers: Mutex<HashMap<String, Vec<Record>>>,
    path: Option<PathBuf>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a container with records
    pub fn with_records(container_id: impl Into<String>, records: Vec<Record>) -> Self {
        let mut containers = HashMap::new();
        containers.insert(container_id.into(), records);
        Self {
            containers: Mutex::new(containers),
            path: None,
        }
    }

    /// Load a record file, writing changes back to it after every batch update.
    /// A missing file starts out empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let containers = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read record file: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse record file: {}", path.display()))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            containers: Mutex::new(containers),
            path: Some(path),
        })
    }

    /// Snapshot of a container's records
    pub async fn records(&self, container_id: &str) -> Vec<Record> {
        self.containers
            .lock()
            .await
            .get(container_id)
            .cloned()
            .unwrap_or_default()
    }

    /// All container ids, sorted
    pub async fn container_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.containers.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Append records to a container and persist
    pub async fn insert(&self, container_id: &str, records: Vec<Record>) -> Result<()> {
        let mut containers = self.containers.lock().await;
        let mut staged = containers.get(container_id).cloned().unwrap_or_default();
        staged.extend(records);
        self.commit(&mut containers, container_id, staged).await
    }

    /// Replace a container's records, keeping the old ones if the file write
    /// fails so memory and file stay in step
    async fn commit(
        &self,
        containers: &mut HashMap<String, Vec<Record>>,
        container_id: &str,
        records: Vec<Record>,
    ) -> Result<()> {
        let previous = containers.insert(container_id.to_string(), records);
        if let Err(err) = self.persist(containers).await {
            match previous {
                Some(previous) => containers.insert(container_id.to_string(), previous),
                None => containers.remove(container_id),
            };
            return Err(err);
        }
        Ok(())
    }

    async fn persist(&self, containers: &HashMap<String, Vec<Record>>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(containers)
            .context("Failed to serialize record file")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write record file: {}", path.display()))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch(&self, container_id: &str, _options: &FetchOptions) -> Result<Vec<Record>> {
        Ok(self.records(container_id).await)
    }

    async fn batch_update(&self, container_id: &str, updates: &[RecordUpdate]) -> Result<()> {
        let mut containers = self.containers.lock().await;
        let mut staged = containers
            .get(container_id)
            .cloned()
            .with_context(|| format!("Container '{}' does not exist", container_id))?;

        let known: HashSet<&str> = staged.iter().map(|r| r.id.as_str()).collect();
        if let Some(missing) = updates.iter().find(|u| !known.contains(u.id.as_str())) {
            anyhow::bail!(
                "Record '{}' not found in container '{}'",
                missing.id,
                container_id
            );
        }

        let by_id: HashMap<&str, &RecordUpdate> =
            updates.iter().map(|u| (u.id.as_str(), u)).collect();
        for record in staged.iter_mut() {
            if let Some(update) = by_id.get(record.id.as_str()) {
                record.apply(update);
            }
        }

        self.commit(&mut containers, container_id, staged).await?;
        log::debug!(
            "Applied {} record updates to container '{}'",
            updates.len(),
            container_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{FIRST_NAME, PHONE};
    use serde_json::json;

    #[tokio::test]
    async fn test_batch_update_writes_wrapped_values() {
        let store = InMemoryRecordStore::with_records(
            "sheet",
            vec![Record::new("1").with_field(FIRST_NAME, "JOHN")],
        );
        let mut update = RecordUpdate::new("1");
        update.set(FIRST_NAME, "John");

        store.batch_update("sheet", &[update]).await.unwrap();

        let records = store.records("sheet").await;
        assert_eq!(
            serde_json::to_value(&records[0].values[FIRST_NAME]).unwrap(),
            json!({"value": "John"})
        );
    }

    #[tokio::test]
    async fn test_unknown_record_rejects_whole_batch() {
        let store = InMemoryRecordStore::with_records(
            "sheet",
            vec![Record::new("1").with_field(PHONE, "5551234567")],
        );
        let mut known = RecordUpdate::new("1");
        known.set(PHONE, "+1 (555) 123-4567");
        let mut unknown = RecordUpdate::new("404");
        unknown.set(PHONE, "+1");

        let err = store.batch_update("sheet", &[known, unknown]).await.unwrap_err();

        assert!(err.to_string().contains("404"));
        assert_eq!(store.records("sheet").await[0].read_str(PHONE), Some("5551234567"));
    }

    #[tokio::test]
    async fn test_unknown_container_fetches_empty() {
        let store = InMemoryRecordStore::new();
        let records = store.fetch("nope", &FetchOptions::default()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_file_persistence() {
        let path = std::env::temp_dir().join(format!("contacts-{}.json", uuid::Uuid::new_v4()));

        let store = InMemoryRecordStore::open(&path).await.unwrap();
        store
            .insert("sheet", vec![Record::new("1").with_field(FIRST_NAME, "ada")])
            .await
            .unwrap();
        let mut update = RecordUpdate::new("1");
        update.set(FIRST_NAME, "Ada");
        store.batch_update("sheet", &[update]).await.unwrap();

        let reopened = InMemoryRecordStore::open(&path).await.unwrap();
        assert_eq!(reopened.container_ids().await, vec!["sheet".to_string()]);
        assert_eq!(reopened.records("sheet").await[0].read_str(FIRST_NAME), Some("Ada"));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_records_untouched() {
        let mut containers = HashMap::new();
        containers.insert(
            "sheet".to_string(),
            vec![Record::new("1").with_field(FIRST_NAME, "ada")],
        );
        // A directory cannot be written as a file
        let store = InMemoryRecordStore {
            containers: Mutex::new(containers),
            path: Some(std::env::temp_dir()),
        };
        let mut update = RecordUpdate::new("1");
        update.set(FIRST_NAME, "Ada");

        let err = store.batch_update("sheet", &[update]).await.unwrap_err();
        assert!(err.to_string().contains("Failed to write record file"));
        assert_eq!(store.records("sheet").await[0].read_str(FIRST_NAME), Some("ada"));

        assert!(store.insert("other", vec![Record::new("2")]).await.is_err());
        assert_eq!(store.container_ids().await, vec!["sheet".to_string()]);
    }
}
