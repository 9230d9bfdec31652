//! Per-container run serialization
//!
//! Two formatting runs against the same container can both compute a batch
//! from the same read and overwrite each other's duplicate classification.
//! `ContainerLocks` hands out one async mutex per container id so runs in the
//! same process take turns. A container's entry is dropped again once no run
//! holds or waits for it.

use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct ContainerLocks {
    locks: Arc<StdMutex<LockMap>>,
    runs_acquired: Arc<AtomicU64>,
    runs_waited: Arc<AtomicU64>,
}

/// Exclusive hold on one container, released on drop
#[derive(Debug)]
pub struct ContainerGuard {
    guard: Option<OwnedMutexGuard<()>>,
    container_id: String,
    locks: Arc<StdMutex<LockMap>>,
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Every pending acquire holds a clone, so a count of one means the
        // map is the only owner left
        let mut locks = lock_map(&self.locks);
        let unused = locks
            .get(&self.container_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            locks.remove(&self.container_id);
        }
    }
}

fn lock_map(locks: &StdMutex<LockMap>) -> MutexGuard<'_, LockMap> {
    locks.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ContainerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, container_id: &str) -> Arc<Mutex<()>> {
        lock_map(&self.locks)
            .entry(container_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn guard(&self, container_id: &str, guard: OwnedMutexGuard<()>) -> ContainerGuard {
        self.runs_acquired.fetch_add(1, Ordering::Relaxed);
        ContainerGuard {
            guard: Some(guard),
            container_id: container_id.to_string(),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Wait until no other run holds the container, then hold it until the
    /// returned guard is dropped.
    pub async fn acquire(&self, container_id: &str) -> ContainerGuard {
        let lock = self.lock_for(container_id);

        let guard = match lock.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                self.runs_waited.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Container '{}' is being formatted by another run, waiting",
                    container_id
                );
                lock.lock_owned().await
            }
        };

        self.guard(container_id, guard)
    }

    /// Take the container only if it is free
    pub fn try_acquire(&self, container_id: &str) -> Option<ContainerGuard> {
        let guard = self.lock_for(container_id).try_lock_owned().ok()?;
        Some(self.guard(container_id, guard))
    }

    pub fn stats(&self) -> LockStats {
        LockStats {
            containers: lock_map(&self.locks).len(),
            runs_acquired: self.runs_acquired.load(Ordering::Relaxed),
            runs_waited: self.runs_waited.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockStats {
    /// Containers currently held or waited on
    pub containers: usize,
    pub runs_acquired: u64,
    /// Runs that found their container busy
    pub runs_waited: u64,
}
