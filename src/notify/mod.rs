//! # Slack notification
//!
//! Posts the run verdict with a button linking to the published report.

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::clock::brasilia_timestamp;
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::http::{HttpClient, RequestBody, RequestInput};

const COLOR_SUCCESS: &str = "#36a64f";
const COLOR_FAILURE: &str = "#ff0000";

/// What happened to the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// No webhook configured.
    Skipped,
}

/// Exit code `0` or the literal `success` mean the run passed.
pub fn is_success(status_arg: &str) -> bool {
    matches!(status_arg.trim(), "0" | "success")
}

/// Link to the report's `index.html`, with the execution id as a cache
/// buster.
pub fn report_link(report_url: &str, execution_id: &str) -> String {
    let base = report_url.strip_suffix('/').unwrap_or(report_url);
    format!("{base}/index.html?v={execution_id}")
}

/// Inputs of one Slack message.
#[derive(Debug, Clone)]
pub struct Notification {
    pub success: bool,
    pub environment: String,
    pub execution_id: String,
    pub report_link: String,
    pub timestamp: String,
}

/// Slack payload: a headline plus one coloured attachment with a summary
/// section and a report button.
pub fn build_message(n: &Notification) -> Value {
    let (headline, color, verdict, style) = if n.success {
        (
            "✅ *Testes de API concluídos com SUCESSO!*",
            COLOR_SUCCESS,
            "PASSOU",
            "primary",
        )
    } else {
        (
            "❌ *Falha detectada nos Testes de API!*",
            COLOR_FAILURE,
            "FALHOU",
            "danger",
        )
    };

    let summary = format!(
        "*Cenário:* Agrofel 5.2.3 - Listagem de pedidos\n\
         *Ambiente:* {}\n\
         *ID da Execução (GitHub Run):* `#{}`\n\
         *Resultado:* {verdict}\n\
         *Data/Hora:* {}\n\n\
         _Dica: Se o relatório parecer antigo, use CTRL+F5._",
        n.environment, n.execution_id, n.timestamp
    );

    json!({
        "text": headline,
        "attachments": [{
            "color": color,
            "blocks": [
                {
                    "type": "section",
                    "text": { "type": "mrkdwn", "text": summary }
                },
                {
                    "type": "actions",
                    "elements": [{
                        "type": "button",
                        "text": { "type": "plain_text", "text": "Visualizar Report Allure 📊" },
                        "url": n.report_link,
                        "style": style
                    }]
                }
            ]
        }]
    })
}

/// Send the verdict for `status_arg` to the configured webhook.
///
/// Without a webhook the notification is skipped. A webhook without a
/// report URL is a configuration error.
pub async fn notify(
    config: &ProbeConfig,
    client: &HttpClient,
    status_arg: &str,
    execution_id: &str,
) -> Result<NotifyOutcome> {
    let Some(webhook_url) = config.slack.webhook_url.as_deref() else {
        warn!("SLACK_WEBHOOK_URL not configured, skipping notification");
        return Ok(NotifyOutcome::Skipped);
    };
    let report_url = config.slack.report_url.as_deref().ok_or_else(|| {
        ProbeError::Config("REPORT_URL is required when SLACK_WEBHOOK_URL is set".into())
    })?;

    let notification = Notification {
        success: is_success(status_arg),
        environment: config.base_url().to_string(),
        execution_id: execution_id.to_string(),
        report_link: report_link(report_url, execution_id),
        timestamp: brasilia_timestamp(Utc::now()),
    };
    let message = build_message(&notification);

    let response = client
        .send(RequestInput::post(webhook_url).body(RequestBody::Json(message)))
        .await
        .inspect_err(|e| warn!(error = %e, "failed to reach Slack"))?;

    if !response.is_success() {
        return Err(ProbeError::Notify(format!(
            "Slack responded {} {}: {}",
            response.status, response.status_text, response.body
        )));
    }

    info!(
        success = notification.success,
        link = %notification.report_link,
        reply = %response.body,
        "Slack notified"
    );
    Ok(NotifyOutcome::Sent)
}
