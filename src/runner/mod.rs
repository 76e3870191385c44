//! # Full run orchestration
//!
//! Clean the artifact directories, run the scenario, render the report,
//! give the publisher time to pick it up and post the verdict. The
//! scenario's exit code is what the process exits with; report and
//! notification problems are logged but never change it.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::clock::execution_id;
use crate::config::ProbeConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::notify;
use crate::report::{self, reset_dir};
use crate::scenario;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Skip the Slack step entirely.
    pub skip_notify: bool,
}

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub execution_id: String,
    pub exit_code: i32,
    pub report_generated: bool,
    pub notified: bool,
}

pub async fn run_all(config: &ProbeConfig, options: &RunOptions) -> Result<RunSummary> {
    let execution_id = execution_id(Utc::now());
    info!(execution_id = %execution_id, "starting run");

    for dir in [&config.report.results_dir, &config.report.report_dir] {
        match reset_dir(dir) {
            Ok(()) => info!(dir = %dir.display(), "cleaned"),
            Err(e) => warn!(dir = %dir.display(), error = %e, "could not clean directory"),
        }
    }

    let client = HttpClient::new(&config.http)?;

    let exit_code = match scenario::execute(config, &client).await {
        Ok(outcome) => outcome.exit_code,
        Err(e) => {
            warn!(error = %e, "scenario could not run");
            e.exit_code()
        }
    };

    let report_generated = match report::generate(
        &config.report.results_dir,
        &config.report.report_dir,
        &execution_id,
    ) {
        Ok(summary) => {
            info!(total = summary.total, passed = summary.passed, "report ready");
            true
        }
        Err(e) => {
            warn!(error = %e, "report generation failed");
            false
        }
    };

    let mut notified = false;
    if !options.skip_notify {
        if config.report.sync_delay_secs > 0 {
            info!(secs = config.report.sync_delay_secs, "waiting for report publication");
            tokio::time::sleep(Duration::from_secs(config.report.sync_delay_secs)).await;
        }

        match notify::notify(config, &client, &exit_code.to_string(), &execution_id).await {
            Ok(outcome) => notified = outcome == notify::NotifyOutcome::Sent,
            Err(e) => warn!(error = %e, "notification failed"),
        }
    }

    info!(execution_id = %execution_id, exit_code, "run finished");
    Ok(RunSummary {
        execution_id,
        exit_code,
        report_generated,
        notified,
    })
}
