//! orderprobe: an end-to-end contract check for the marketplace
//! partner-orders API.
//!
//! The scenario authenticates, picks the customer's latest order, fetches
//! its detail and validates it against a JSON Schema contract. Results feed
//! a static HTML report and a Slack notification.

pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod notify;
pub mod orders;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod schema;
pub mod testing;

pub use config::ProbeConfig;
pub use error::{ProbeError, Result};
