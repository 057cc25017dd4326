//! Rendering of command results for humans and scripts.

mod format;
mod report;

pub use format::OutputFormat;
pub use report::{ProgressReport, outcome_line, print_json, print_outcome, print_warning, summary_line};
