//! # Command line
//!
//! `orderprobe run` chains every stage for CI; the other subcommands run a
//! single stage so each can be retried or scheduled on its own.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ProbeConfig;

/// End-to-end contract check for the partner-orders API
#[derive(Debug, Parser)]
#[command(name = "orderprobe", version, about)]
pub struct Cli {
    /// Config file path (defaults to ./orderprobe.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean, run the scenario, build the report and notify Slack
    Run {
        /// Do not post to Slack
        #[arg(long)]
        no_notify: bool,

        /// Seconds to wait between report generation and notification
        #[arg(long)]
        sync_delay: Option<u64>,
    },
    /// Run the scenario only and write its result
    Scenario {
        /// Directory the result is written to
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
    /// Render the HTML report from stored results
    Report {
        #[arg(long)]
        results_dir: Option<PathBuf>,

        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Identifier shown in the report header
        #[arg(long, default_value = "local")]
        execution_id: String,
    },
    /// Post the verdict to Slack
    Notify {
        /// Exit code of the run, or `success`
        #[arg(default_value = "unknown")]
        status: String,

        /// Execution id used as the report cache buster
        #[arg(default_value = "local")]
        execution_id: String,
    },
}

impl Cli {
    /// Apply flags on top of file and environment settings.
    pub fn apply_overrides(&self, config: &mut ProbeConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }

        match &self.command {
            Command::Run { sync_delay, .. } => {
                if let Some(secs) = sync_delay {
                    config.report.sync_delay_secs = *secs;
                }
            }
            Command::Scenario { results_dir } => {
                if let Some(dir) = results_dir {
                    config.report.results_dir = dir.clone();
                }
            }
            Command::Report {
                results_dir,
                report_dir,
                ..
            } => {
                if let Some(dir) = results_dir {
                    config.report.results_dir = dir.clone();
                }
                if let Some(dir) = report_dir {
                    config.report.report_dir = dir.clone();
                }
            }
            Command::Notify { .. } => {}
        }
    }
}
