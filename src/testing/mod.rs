//! # Run state, steps and results
//!
//! Records what one scenario run did: the pass/fail state and log lines,
//! the tree of steps with their parameters and evidence attachments, and
//! the final `TestResult` written to the results directory.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::error::{ProbeError, Result};
use crate::http::HttpResponse;

pub const JSON_MIME: &str = "application/json";

/// Pass/fail state and log of one run. Discarded after the run except for
/// its JSON snapshot attached to the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub success: bool,
    pub error_message: Option<String>,
    pub test_logs: Vec<String>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            success: true,
            error_message: None,
            test_logs: Vec::new(),
        }
    }
}

impl RunState {
    pub fn ok(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{line}");
        self.test_logs.push(line);
    }

    /// Mark the run failed with `message` and return the error that aborts it.
    pub fn fail(&mut self, step: &str, message: impl Into<String>) -> ProbeError {
        let message = message.into();
        self.success = false;
        self.error_message = Some(message.clone());
        let line = format!("[ERRO] {step}: {message}");
        error!("{line}");
        self.test_logs.push(line);
        ProbeError::Scenario(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    /// The run could not reach a verdict (transport error, missing schema).
    Broken,
    Skipped,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Broken => "broken",
            Status::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub content: String,
}

impl Attachment {
    /// Pretty-printed JSON, two-space indented.
    pub fn json(name: impl Into<String>, data: &Value) -> Self {
        Self {
            name: name.into(),
            mime_type: JSON_MIME.to_string(),
            content: serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub status: Status,
    pub start: i64,
    pub stop: i64,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

impl StepRecord {
    fn open(name: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            name: name.into(),
            status: Status::Passed,
            start: now,
            stop: now,
            parameters: Vec::new(),
            attachments: Vec::new(),
            steps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub url: String,
}

/// Serialized outcome of one test, as stored in the results directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub uuid: String,
    pub name: String,
    pub full_name: String,
    pub status: Status,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub links: Vec<Link>,
    pub start: i64,
    pub stop: i64,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

impl TestResult {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    pub fn duration_ms(&self) -> i64 {
        (self.stop - self.start).max(0)
    }
}

/// Builds a `TestResult` while the scenario runs.
///
/// Steps nest: parameters and attachments go to the innermost open step,
/// or to the test itself when no step is open.
#[derive(Debug)]
pub struct Recorder {
    result: TestResult,
    open: Vec<StepRecord>,
}

impl Recorder {
    pub fn new(name: impl Into<String>, full_name: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            result: TestResult {
                uuid: uuid::Uuid::new_v4().to_string(),
                name: name.into(),
                full_name: full_name.into(),
                status: Status::Passed,
                status_message: None,
                description: None,
                labels: Vec::new(),
                links: Vec::new(),
                start: now,
                stop: now,
                parameters: Vec::new(),
                attachments: Vec::new(),
                steps: Vec::new(),
            },
            open: Vec::new(),
        }
    }

    pub fn label(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.result.labels.push(Label {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn severity(&mut self, value: &str) -> &mut Self {
        self.label("severity", value)
    }

    pub fn feature(&mut self, value: &str) -> &mut Self {
        self.label("feature", value)
    }

    pub fn story(&mut self, value: &str) -> &mut Self {
        self.label("story", value)
    }

    pub fn link(&mut self, name: &str, url: impl Into<String>) -> &mut Self {
        self.result.links.push(Link {
            name: name.to_string(),
            url: url.into(),
        });
        self
    }

    pub fn description(&mut self, text: &str) -> &mut Self {
        self.result.description = Some(text.to_string());
        self
    }

    pub fn start_step(&mut self, name: impl Into<String>) {
        self.open.push(StepRecord::open(name));
    }

    /// Close the innermost open step. A no-op when none is open.
    pub fn end_step(&mut self, status: Status) {
        let Some(mut step) = self.open.pop() else {
            return;
        };
        step.status = status;
        step.stop = now_millis();
        match self.open.last_mut() {
            Some(parent) => parent.steps.push(step),
            None => self.result.steps.push(step),
        }
    }

    pub fn parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let parameter = Parameter {
            name: name.into(),
            value: value.into(),
        };
        match self.open.last_mut() {
            Some(step) => step.parameters.push(parameter),
            None => self.result.parameters.push(parameter),
        }
    }

    pub fn attach_json(&mut self, name: impl Into<String>, data: &Value) {
        let attachment = Attachment::json(name, data);
        match self.open.last_mut() {
            Some(step) => step.attachments.push(attachment),
            None => self.result.attachments.push(attachment),
        }
    }

    /// Close every open step with `status`, innermost first.
    pub fn close_steps(&mut self, status: Status) {
        while !self.open.is_empty() {
            self.end_step(status);
        }
    }

    /// Close any open steps and seal the result.
    pub fn finish(mut self, status: Status, message: Option<String>) -> TestResult {
        self.close_steps(status);
        self.result.status = status;
        self.result.status_message = message;
        self.result.stop = now_millis();
        self.result
    }
}

/// Check that `response` is 2xx.
///
/// On failure the run state is marked failed, the evidence is attached as
/// `Erro — {step_label}` and the returned error carries the status and body.
pub fn assert_success(
    response: &HttpResponse,
    step_label: &str,
    state: &mut RunState,
    recorder: &mut Recorder,
) -> Result<()> {
    if response.is_success() {
        state.ok(format!("[OK] {step_label}: HTTP {}", response.status));
        return Ok(());
    }

    let body = response.json();
    let detail = json!({
        "step": step_label,
        "statusCode": response.status,
        "responseBody": body,
    });
    let detail_text = detail.to_string();

    state.success = false;
    state.error_message = Some(detail_text.clone());
    let line = format!(
        "[ERRO] {step_label}: HTTP {} — {}",
        response.status,
        body
    );
    error!("{line}");
    state.test_logs.push(line);
    recorder.attach_json(format!("Erro — {step_label}"), &detail);

    Err(ProbeError::Scenario(format!(
        "{step_label} falhou com status {}. Detalhes: {detail_text}",
        response.status
    )))
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
