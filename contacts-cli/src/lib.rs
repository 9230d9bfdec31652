//! Contact record normalization
//!
//! Normalizes imported contact records (name casing, phone formatting, USA
//! number classification) and flags duplicate rows within a batch, writing
//! back only the fields that changed so repeated runs settle.

pub mod api;
pub mod cli;
pub mod config;
pub mod formatting;

pub use config::Config;
pub use formatting::{FormattingPipeline, RunReport};
