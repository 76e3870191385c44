//! Configuration — `orderprobe.toml` parsing and environment overrides
//!
//! # Loading precedence
//! 1. CLI flags (highest)
//! 2. Environment variables (`BASE_URL`, `CYPRESS_BASE_URL`, `ORDERPROBE_*`)
//! 3. Config file (`orderprobe.toml`)
//! 4. Defaults (`Default` impls)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ProbeError, Result};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "orderprobe.toml";

pub const DEFAULT_BASE_URL: &str = "https://ws.autorei.net";
pub const DEFAULT_CUSTOMER_DOC: &str = "503.961.710-01";
pub const DEFAULT_SCHEMA_NAME: &str = "Agrofel-JSONSCHEMA-5.2.3";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Top-level configuration. Each stage reads only its own section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub overrides: OverrideConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub slack: SlackConfig,
}

impl ProbeConfig {
    /// Load the config file (if any), apply environment overrides and validate.
    ///
    /// An explicit `path` must exist. Without one, `orderprobe.toml` in the
    /// working directory is used when present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::load_unvalidated(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`ProbeConfig::load`] but leaves validation to the caller, so CLI
    /// flags can be layered on first.
    pub fn load_unvalidated(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(&fallback)?
                } else {
                    debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load a TOML file without applying overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProbeError::Config(format!("config file not found: {}", path.display()))
            } else {
                ProbeError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    pub fn parse(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| ProbeError::Config(e.to_string()))
    }

    /// Override settings from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary variable source.
    ///
    /// Every key is tried bare and with the `CYPRESS_` prefix the scheduled
    /// jobs export. Empty values count as unset.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| -> Option<String> {
            lookup(key)
                .or_else(|| lookup(&format!("CYPRESS_{key}")))
                .filter(|v| !v.trim().is_empty())
        };

        if let Some(v) = get("BASE_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = get("CUSTOMER_DOC") {
            self.api.customer_doc = v;
        }
        override_opt(&mut self.api.run_id, get("GITHUB_RUN_ID"));

        override_opt(&mut self.auth.basic, get("AUTH_BASIC"));
        override_opt(&mut self.auth.username, get("AUTH_USERNAME"));
        override_opt(&mut self.auth.password, get("AUTH_PASSWORD"));

        override_opt(&mut self.overrides.access_token, get("FIXED_ACCESS_TOKEN"));
        override_opt(&mut self.overrides.order_id, get("FIXED_ORDER_ID"));

        override_opt(&mut self.slack.webhook_url, get("SLACK_WEBHOOK_URL"));
        override_opt(&mut self.slack.report_url, get("REPORT_URL"));

        if let Some(v) = get("ORDERPROBE_LOG_LEVEL") {
            self.general.log_level = v;
        }
        if let Some(v) = get("ORDERPROBE_LOG_FORMAT") {
            self.general.log_format = v;
        }
        if let Some(v) = get("ORDERPROBE_SCHEMA_DIR") {
            self.schema.dir = PathBuf::from(v);
        }
        if let Some(v) = get("ORDERPROBE_SCHEMA_NAME") {
            self.schema.name = v;
        }
        if let Some(v) = get("ORDERPROBE_RESULTS_DIR") {
            self.report.results_dir = PathBuf::from(v);
        }
        if let Some(v) = get("ORDERPROBE_REPORT_DIR") {
            self.report.report_dir = PathBuf::from(v);
        }
        override_u64(
            &mut self.report.sync_delay_secs,
            get("ORDERPROBE_SYNC_DELAY_SECS"),
            "ORDERPROBE_SYNC_DELAY_SECS",
        );
        override_u64(
            &mut self.http.timeout_secs,
            get("ORDERPROBE_HTTP_TIMEOUT_SECS"),
            "ORDERPROBE_HTTP_TIMEOUT_SECS",
        );
    }

    /// Check values that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ProbeError::Config(format!(
                "invalid log_level '{}', expected one of {:?}",
                self.general.log_level, LOG_LEVELS
            )));
        }
        if !LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ProbeError::Config(format!(
                "invalid log_format '{}', expected one of {:?}",
                self.general.log_format, LOG_FORMATS
            )));
        }

        let base = self.api.base_url.trim();
        if base.is_empty() {
            return Err(ProbeError::Config("api.base_url must not be empty".into()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProbeError::Config(format!(
                "api.base_url must be an http(s) URL, got '{base}'"
            )));
        }

        if self.http.timeout_secs == 0 {
            return Err(ProbeError::Config("http.timeout_secs must be > 0".into()));
        }

        Ok(())
    }

    /// Extra checks only the scenario stage needs; `report` and `notify`
    /// run without API credentials.
    pub fn validate_scenario(&self) -> Result<()> {
        if self.overrides.access_token.is_none()
            && (self.auth.username.is_none() || self.auth.password.is_none())
        {
            return Err(ProbeError::Config(
                "AUTH_USERNAME and AUTH_PASSWORD are required unless FIXED_ACCESS_TOKEN is set"
                    .into(),
            ));
        }

        if self.overrides.order_id.is_none() && self.api.customer_doc.trim().is_empty() {
            return Err(ProbeError::Config(
                "api.customer_doc must not be empty unless FIXED_ORDER_ID is set".into(),
            ));
        }

        Ok(())
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.api.base_url.trim().trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Customer whose most recent order is checked.
    #[serde(default = "default_customer_doc")]
    pub customer_doc: String,
    /// CI run identifier shown in the report environment table.
    #[serde(default)]
    pub run_id: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            customer_doc: default_customer_doc(),
            run_id: None,
        }
    }
}

/// Credentials for the password grant. Never commit these to the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Pre-encoded `client:secret` sent as `Authorization: Basic ...`.
    #[serde(default)]
    pub basic: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Fixed values that skip steps 1 and 2 of the scenario.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default = "default_schema_dir")]
    pub dir: PathBuf,
    /// File stem of the order detail contract inside `dir`.
    #[serde(default = "default_schema_name")]
    pub name: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            dir: default_schema_dir(),
            name: default_schema_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    /// Pause between report generation and notification so the published
    /// report is in place before the link is posted.
    #[serde(default = "default_sync_delay_secs")]
    pub sync_delay_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            report_dir: default_report_dir(),
            sync_delay_secs: default_sync_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Public base URL where the report directory is published.
    #[serde(default)]
    pub report_url: Option<String>,
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "pretty".to_owned()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_customer_doc() -> String {
    DEFAULT_CUSTOMER_DOC.to_owned()
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_schema_name() -> String {
    DEFAULT_SCHEMA_NAME.to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("probe-results")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("probe-report")
}

fn default_sync_delay_secs() -> u64 {
    12
}

fn override_opt(target: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *target = Some(v);
    }
}

fn override_u64(target: &mut u64, value: Option<String>, env_key: &str) {
    if let Some(v) = value {
        match v.trim().parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = env_key, value = %v, "ignoring non-numeric override"),
        }
    }
}
