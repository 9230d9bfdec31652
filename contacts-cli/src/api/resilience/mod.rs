//! Resilience features for store interactions
//!
//! Provides the retry policy used by record fetches and the per-container
//! lock that keeps formatting runs from racing each other.

pub mod concurrency;
pub mod retry;

pub use concurrency::{ContainerGuard, ContainerLocks, LockStats};
pub use retry::{BackoffStrategy, RetryConfig};
