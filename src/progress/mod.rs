//! Progress logging for delay comparisons.
//!
//! - `progress_log`: bounded record buffer with an optional file sink
//! - `log_parser`: reading written logs back and summarizing them

pub mod log_parser;
pub mod progress_log;

pub use log_parser::{ComparisonSummary, load_comparison_log};
pub use progress_log::{DELAY_COMPARISON_CHANNEL, ProgressLog, ProgressRecord, comparison_payload};
