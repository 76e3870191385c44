//! # Contract validation
//!
//! Loads JSON Schema contracts from a directory by name and checks response
//! bodies against them, collecting every violation rather than stopping at
//! the first one.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ProbeError, Result};

const VIOLATION_SEPARATOR: &str = "\n────────────────────";

/// One place where a body breaks its contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// JSON pointer into the body, `/` for the root.
    pub field: String,
    pub message: String,
    /// The offending value, serialized.
    pub received: String,
    /// JSON pointer into the schema of the keyword that failed.
    pub expected: String,
}

/// Outcome of validating one body against one contract.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub schema_name: String,
    pub violations: Vec<Violation>,
}

impl SchemaReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable failure text, one block per violation.
    pub fn failure_message(&self) -> String {
        let blocks: Vec<String> = self
            .violations
            .iter()
            .map(|v| {
                let mut block = String::new();
                let _ = write!(
                    block,
                    "\nCampo: {}\nErro: {}\nRecebido: {}\nEsperado: {}\n",
                    v.field, v.message, v.received, v.expected
                );
                block
            })
            .collect();
        format!(
            "❌ Falha de Contrato no Cenário 5.2.3\nFalha na validação do contrato [{}]:\n{}",
            self.schema_name,
            blocks.join(VIOLATION_SEPARATOR)
        )
    }
}

/// Directory of `<name>.json` schema files.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    dir: PathBuf,
}

impl SchemaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    pub fn load(&self, name: &str) -> Result<Value> {
        let path = self.path_for(name);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            ProbeError::Schema(format!("Failed to read schema `{}`: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ProbeError::Schema(format!("Failed to parse schema `{}`: {e}", path.display()))
        })
    }

    /// Validate `body` against the named contract.
    ///
    /// A body that breaks the contract is an `Ok` report with violations;
    /// only a missing or broken schema is an error.
    pub fn validate(&self, name: &str, body: &Value) -> Result<SchemaReport> {
        let schema = self.load(name)?;
        let report = validate_against(name, &schema, body)?;
        if report.is_valid() {
            info!(schema = name, "SCHEMA SUCCESS: {name}");
        } else {
            warn!(
                schema = name,
                violations = report.violations.len(),
                "SCHEMA FAIL: {name}"
            );
        }
        Ok(report)
    }
}

/// Validate against an already-loaded schema document.
pub fn validate_against(name: &str, schema: &Value, body: &Value) -> Result<SchemaReport> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| ProbeError::Schema(format!("Invalid schema `{name}`: {e}")))?;

    let violations = validator
        .iter_errors(body)
        .map(|error| {
            let field = error.instance_path.to_string();
            Violation {
                field: if field.is_empty() { "/".to_string() } else { field },
                message: error.to_string(),
                received: serde_json::to_string(error.instance.as_ref())
                    .unwrap_or_else(|_| "<unserializable>".to_string()),
                expected: error.schema_path.to_string(),
            }
        })
        .collect();

    Ok(SchemaReport {
        schema_name: name.to_string(),
        violations,
    })
}
