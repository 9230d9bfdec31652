//! Store and reporter doubles for unit tests

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::jobs::JobReporter;
use super::models::{Record, RecordUpdate};
use super::store::{FetchOptions, RecordStore};

/// One scripted fetch outcome
pub enum Scripted {
    Records(Vec<Record>),
    Error(&'static str),
}

/// Replays fetch outcomes in order; the last one repeats once the script runs out
pub struct ScriptedStore {
    script: Mutex<VecDeque<Scripted>>,
    fetches: AtomicUsize,
    pub submitted: Mutex<Vec<Vec<RecordUpdate>>>,
}

impl ScriptedStore {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fetches: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<Vec<RecordUpdate>> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for ScriptedStore {
    async fn fetch(&self, _container_id: &str, _options: &FetchOptions) -> Result<Vec<Record>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().map(|s| match s {
                Scripted::Records(records) => Scripted::Records(records.clone()),
                Scripted::Error(message) => Scripted::Error(message),
            })
        };

        match next {
            Some(Scripted::Records(records)) => Ok(records),
            Some(Scripted::Error(message)) => anyhow::bail!(message),
            None => Ok(Vec::new()),
        }
    }

    async fn batch_update(&self, _container_id: &str, updates: &[RecordUpdate]) -> Result<()> {
        self.submitted.lock().unwrap().push(updates.to_vec());
        Ok(())
    }
}

/// Serves fixed records but rejects every batch update
pub struct FailingUpdateStore {
    records: Vec<Record>,
    message: &'static str,
}

impl FailingUpdateStore {
    pub fn new(records: Vec<Record>, message: &'static str) -> Self {
        Self { records, message }
    }
}

#[async_trait]
impl RecordStore for FailingUpdateStore {
    async fn fetch(&self, _container_id: &str, _options: &FetchOptions) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }

    async fn batch_update(&self, _container_id: &str, _updates: &[RecordUpdate]) -> Result<()> {
        anyhow::bail!(self.message)
    }
}

/// Records reporter calls as `action:job_id:text` strings
#[derive(Default)]
pub struct RecordingReporter {
    calls: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobReporter for RecordingReporter {
    async fn acknowledge(&self, job_id: &str, info: &str, _progress: u8) -> Result<()> {
        self.calls.lock().unwrap().push(format!("ack:{}:{}", job_id, info));
        Ok(())
    }

    async fn complete(&self, job_id: &str, message: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("complete:{}:{}", job_id, message));
        Ok(())
    }

    async fn fail(&self, job_id: &str, message: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("fail:{}:{}", job_id, message));
        Ok(())
    }
}
