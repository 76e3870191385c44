use anyhow::Context;
use clap::Parser;

use orderprobe::cli::{Cli, Command};
use orderprobe::config::ProbeConfig;
use orderprobe::error::ProbeError;
use orderprobe::http::HttpClient;
use orderprobe::runner::{RunOptions, run_all};
use orderprobe::{logging, notify, report, scenario};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            err.downcast_ref::<ProbeError>()
                .map_or(1, ProbeError::exit_code)
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = ProbeConfig::load_unvalidated(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    logging::init_tracing(&config.general)?;
    tracing::info!(command = ?cli.command, "orderprobe starting");

    match cli.command {
        Command::Run { no_notify, .. } => {
            let options = RunOptions {
                skip_notify: no_notify,
            };
            let summary = run_all(&config, &options).await?;
            Ok(summary.exit_code)
        }
        Command::Scenario { .. } => {
            let client = HttpClient::new(&config.http)?;
            let outcome = scenario::execute(&config, &client).await?;
            for line in &outcome.state.test_logs {
                println!("{line}");
            }
            Ok(outcome.exit_code)
        }
        Command::Report { execution_id, .. } => {
            let summary = report::generate(
                &config.report.results_dir,
                &config.report.report_dir,
                &execution_id,
            )
            .context("generating report")?;
            println!(
                "report: {} ({} passed / {} total)",
                config.report.report_dir.join("index.html").display(),
                summary.passed,
                summary.total
            );
            Ok(0)
        }
        Command::Notify {
            status,
            execution_id,
        } => {
            let client = HttpClient::new(&config.http)?;
            notify::notify(&config, &client, &status, &execution_id).await?;
            Ok(0)
        }
    }
}
