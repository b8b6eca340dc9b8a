//! Token safety screening module
//!
//! Screens auto-detected token assets before they are cached:
//! - Classifier interface: external batch verdicts per token address
//! - Screener: namespace grouping, bounded batches, fail-open on errors

mod classifier;
mod screener;

pub use classifier::*;
pub use screener::*;
