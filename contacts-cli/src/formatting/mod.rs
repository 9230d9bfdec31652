//! Contact normalization and duplicate flagging
//!
//! This module provides the formatting pipeline: canonical field forms, row
//! signatures, minimal diffs, and the retrying fetch that feeds them.

pub mod canonical;
mod diff;
mod fetcher;
mod pipeline;
pub mod signature;

pub use canonical::{PhoneFormatError, format_phone, is_usa_number, name_case};
pub use diff::{DiffEngine, StatusMarkers};
pub use fetcher::ResilientFetcher;
pub use pipeline::{FormattingPipeline, FormattingPlan, RunReport};
pub use signature::{SignatureCounts, signature};
