//! Error types and exit code mapping

/// Errors raised by any stage of a probe run.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes so the
/// orchestrator can thread them through to the notification step.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// The scenario ran and an assertion failed (non-2xx, missing field,
    /// contract violation).
    #[error("{0}")]
    Scenario(String),

    /// The request could not be built or sent (DNS, connect, timeout, bad URL).
    #[error("http error: {0}")]
    Http(String),

    /// Schema file missing, unreadable, or not a valid JSON Schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// Slack webhook rejected the message or could not be reached.
    #[error("notification error: {0}")]
    Notify(String),

    /// Report template rendering failed.
    #[error("report error: {0}")]
    Report(String),

    /// JSON (de)serialisation failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (results dir, report dir, schema read).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success                        |
    /// | 1    | Scenario failed                |
    /// | 2    | Configuration error            |
    /// | 3    | HTTP transport error           |
    /// | 4    | Schema store error             |
    /// | 5    | Notification error             |
    /// | 10   | IO error                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Scenario(_) | Self::Json(_) | Self::Report(_) => 1,
            Self::Config(_) => 2,
            Self::Http(_) => 3,
            Self::Schema(_) => 4,
            Self::Notify(_) => 5,
            Self::Io(_) => 10,
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<askama::Error> for ProbeError {
    fn from(e: askama::Error) -> Self {
        Self::Report(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
