//! Output module for run accounting and reports
//!
//! This module handles:
//! - Appending run summaries to the run log
//! - Printing run history and provider totals

mod reporter;
pub mod stats;

pub use reporter::RunReporter;
pub use stats::{load_statistics, print_statistics, RunStatistics};
