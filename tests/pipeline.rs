mod common;

use serde_json::json;
use tempfile::TempDir;

use common::{Behavior, MockApi, REPORT_URL, config_for};
use orderprobe::http::HttpClient;
use orderprobe::notify::{self, NotifyOutcome};
use orderprobe::report;
use orderprobe::runner::{RunOptions, run_all};

fn button_url(message: &serde_json::Value) -> &str {
    message["attachments"][0]["blocks"][1]["elements"][0]["url"]
        .as_str()
        .unwrap()
}

#[tokio::test]
async fn passing_run_renders_report_and_notifies_success() {
    let api = MockApi::start(Behavior::default()).await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&api, &dir);

    let summary = run_all(&config, &RunOptions::default()).await.unwrap();

    assert_eq!(summary.exit_code, 0);
    assert!(summary.report_generated);
    assert!(summary.notified);

    let index = config.report.report_dir.join("index.html");
    let html = std::fs::read_to_string(index).unwrap();
    assert!(html.contains(&summary.execution_id));
    assert!(html.contains("status-passed"));
    assert!(config.report.report_dir.join("data/results.json").exists());

    let messages = api.slack_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["text"], "✅ *Testes de API concluídos com SUCESSO!*");
    assert_eq!(
        button_url(&messages[0]),
        format!(
            "{}index.html?v={}",
            REPORT_URL, summary.execution_id
        )
    );
}

#[tokio::test]
async fn failing_run_exits_one_and_notifies_failure() {
    let api = MockApi::start(Behavior {
        token_status: 500,
        token_body: json!({"error": "server_error"}),
        ..Behavior::default()
    })
    .await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&api, &dir);

    let summary = run_all(&config, &RunOptions::default()).await.unwrap();

    assert_eq!(summary.exit_code, 1);
    assert!(summary.report_generated);
    let html = std::fs::read_to_string(config.report.report_dir.join("index.html")).unwrap();
    assert!(html.contains("status-failed"));

    let messages = api.slack_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["attachments"][0]["color"], "#ff0000");
}

#[tokio::test]
async fn stale_results_are_cleared_before_the_run() {
    let api = MockApi::start(Behavior::default()).await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&api, &dir);

    std::fs::create_dir_all(&config.report.results_dir).unwrap();
    let stale = config.report.results_dir.join("old-result.json");
    std::fs::write(&stale, "{}").unwrap();

    let summary = run_all(&config, &RunOptions { skip_notify: true })
        .await
        .unwrap();

    assert!(!stale.exists());
    assert!(!summary.notified);
    assert!(api.slack_messages().is_empty());
    let stored = report::ResultsDir::new(&config.report.results_dir)
        .load_results()
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn slack_rejection_does_not_change_exit_code() {
    let api = MockApi::start(Behavior {
        slack_status: 400,
        ..Behavior::default()
    })
    .await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&api, &dir);

    let summary = run_all(&config, &RunOptions::default()).await.unwrap();

    assert_eq!(summary.exit_code, 0);
    assert!(!summary.notified);
    assert_eq!(api.slack_messages().len(), 1);
}

#[tokio::test]
async fn notify_posts_verdict_for_status_argument() {
    let api = MockApi::start(Behavior::default()).await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&api, &dir);
    let client = HttpClient::new(&config.http).unwrap();

    let outcome = notify::notify(&config, &client, "success", "2026-10-18_09-00-00")
        .await
        .unwrap();
    assert_eq!(outcome, NotifyOutcome::Sent);

    let outcome = notify::notify(&config, &client, "2", "2026-10-18_09-05-00")
        .await
        .unwrap();
    assert_eq!(outcome, NotifyOutcome::Sent);

    let messages = api.slack_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["attachments"][0]["color"], "#36a64f");
    assert_eq!(messages[1]["attachments"][0]["color"], "#ff0000");
    assert_eq!(
        button_url(&messages[1]),
        "https://reports.example.com/agrofel/index.html?v=2026-10-18_09-05-00"
    );
    let summary = messages[0]["attachments"][0]["blocks"][0]["text"]["text"]
        .as_str()
        .unwrap();
    assert!(summary.contains(&format!("*Ambiente:* {}", api.base_url)));
}

#[tokio::test]
async fn notify_surfaces_slack_errors() {
    let api = MockApi::start(Behavior {
        slack_status: 403,
        ..Behavior::default()
    })
    .await;
    let dir = TempDir::new().unwrap();
    let config = config_for(&api, &dir);
    let client = HttpClient::new(&config.http).unwrap();

    let err = notify::notify(&config, &client, "0", "local")
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn report_from_empty_results_dir_still_renders() {
    let dir = TempDir::new().unwrap();
    let results = dir.path().join("results");
    let out = dir.path().join("report");

    let summary = report::generate(&results, &out, "local").unwrap();

    assert_eq!(summary.total, 0);
    assert!(!summary.all_passed());
    let html = std::fs::read_to_string(out.join("index.html")).unwrap();
    assert!(html.contains("Nenhum resultado encontrado."));
}
