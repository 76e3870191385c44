//! # Report
//!
//! Result artifacts written by the scenario and the static HTML report
//! rendered from them.

pub mod html;
pub mod results;

pub use html::{ReportSummary, generate};
pub use results::{ResultsDir, reset_dir};
