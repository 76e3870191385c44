use std::fs;
use std::path::Path;

use askama::Template;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::clock::brasilia_timestamp;
use crate::error::Result;
use crate::testing::{Attachment, Parameter, Status, StepRecord, TestResult};

use super::results::{ResultsDir, reset_dir};

const INDENT_PX: usize = 24;

pub mod filters {
    pub fn duration(ms: &i64) -> askama::Result<String> {
        if *ms >= 1000 {
            Ok(format!("{:.2}s", *ms as f64 / 1000.0))
        } else {
            Ok(format!("{ms}ms"))
        }
    }
}

/// Pass/fail counts over every result in the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub broken: usize,
    pub skipped: usize,
}

impl ReportSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                Status::Passed => summary.passed += 1,
                Status::Failed => summary.failed += 1,
                Status::Broken => summary.broken += 1,
                Status::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn all_passed(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}

/// A step flattened for rendering, with its nesting depth turned into an
/// indent.
pub struct StepRow {
    pub name: String,
    pub status: &'static str,
    pub duration_ms: i64,
    pub indent_px: usize,
    pub parameters: Vec<Parameter>,
    pub attachments: Vec<Attachment>,
}

pub struct TestCard {
    pub name: String,
    pub full_name: String,
    pub status: &'static str,
    pub status_message: String,
    pub description: String,
    pub duration_ms: i64,
    pub labels: Vec<(String, String)>,
    pub links: Vec<(String, String)>,
    pub parameters: Vec<Parameter>,
    pub steps: Vec<StepRow>,
    pub attachments: Vec<Attachment>,
}

impl TestCard {
    fn from_result(result: &TestResult) -> Self {
        let mut steps = Vec::new();
        flatten_steps(&result.steps, 0, &mut steps);
        Self {
            name: result.name.clone(),
            full_name: result.full_name.clone(),
            status: result.status.label(),
            status_message: result.status_message.clone().unwrap_or_default(),
            description: result.description.clone().unwrap_or_default(),
            duration_ms: result.duration_ms(),
            labels: result
                .labels
                .iter()
                .map(|l| (l.name.clone(), l.value.clone()))
                .collect(),
            links: result
                .links
                .iter()
                .map(|l| (l.name.clone(), l.url.clone()))
                .collect(),
            parameters: result.parameters.clone(),
            steps,
            attachments: result.attachments.clone(),
        }
    }
}

fn flatten_steps(steps: &[StepRecord], depth: usize, out: &mut Vec<StepRow>) {
    for step in steps {
        out.push(StepRow {
            name: step.name.clone(),
            status: step.status.label(),
            duration_ms: (step.stop - step.start).max(0),
            indent_px: depth * INDENT_PX,
            parameters: step.parameters.clone(),
            attachments: step.attachments.clone(),
        });
        flatten_steps(&step.steps, depth + 1, out);
    }
}

#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    pub title: String,
    pub execution_id: String,
    pub generated_at: String,
    pub summary: ReportSummary,
    pub tests: Vec<TestCard>,
    pub environment: Vec<Parameter>,
}

/// Render `results_dir` into a fresh static report under `report_dir`.
///
/// Writes `index.html` plus `data/results.json` and `data/environment.json`
/// with the raw inputs. Anything previously in `report_dir` is removed.
pub fn generate(results_dir: &Path, report_dir: &Path, execution_id: &str) -> Result<ReportSummary> {
    let results = ResultsDir::new(results_dir);
    let tests = results.load_results()?;
    let environment = results.load_environment()?;
    let summary = ReportSummary::from_results(&tests);

    let page = ReportTemplate {
        title: "Relatório de Testes de API".to_string(),
        execution_id: execution_id.to_string(),
        generated_at: brasilia_timestamp(Utc::now()),
        summary: summary.clone(),
        tests: tests.iter().map(TestCard::from_result).collect(),
        environment: environment.clone(),
    };
    let html = page.render()?;

    reset_dir(report_dir)?;
    fs::write(report_dir.join("index.html"), html)?;

    let data_dir = report_dir.join("data");
    fs::create_dir_all(&data_dir)?;
    fs::write(
        data_dir.join("results.json"),
        serde_json::to_string_pretty(&tests)?,
    )?;
    fs::write(
        data_dir.join("environment.json"),
        serde_json::to_string_pretty(&environment)?,
    )?;

    info!(
        report = %report_dir.display(),
        total = summary.total,
        passed = summary.passed,
        "report generated"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;
    use serde_json::json;

    fn failed_result() -> TestResult {
        let mut recorder = Recorder::new("<script>alert(1)</script>", "suite");
        recorder.severity("critical");
        recorder.start_step("Step 1 — POST /oauth/token");
        recorder.parameter("Tempo de Resposta (Step 1)", "80ms");
        recorder.attach_json("Response Body — Auth", &json!({"error": "invalid_grant"}));
        recorder.finish(Status::Failed, Some("Step 1 falhou com status 401".into()))
    }

    #[test]
    fn summary_counts_each_status() {
        let results = vec![
            Recorder::new("a", "a").finish(Status::Passed, None),
            Recorder::new("b", "b").finish(Status::Failed, None),
            Recorder::new("c", "c").finish(Status::Broken, None),
        ];
        let summary = ReportSummary::from_results(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.broken, 1);
        assert!(!summary.all_passed());
        assert!(!ReportSummary::default().all_passed());
    }

    #[test]
    fn nested_steps_are_indented() {
        let mut recorder = Recorder::new("t", "t");
        recorder.start_step("outer");
        recorder.start_step("inner");
        let result = recorder.finish(Status::Passed, None);
        let card = TestCard::from_result(&result);
        assert_eq!(card.steps.len(), 2);
        assert_eq!(card.steps[0].indent_px, 0);
        assert_eq!(card.steps[1].indent_px, INDENT_PX);
    }

    #[test]
    fn generate_writes_escaped_html_and_data() {
        let root = tempfile::tempdir().unwrap();
        let results_dir = root.path().join("results");
        let report_dir = root.path().join("report");
        let results = ResultsDir::new(&results_dir);
        results.ensure().unwrap();
        results.write_result(&failed_result()).unwrap();
        results
            .write_environment(&[Parameter {
                name: "Ambiente".into(),
                value: "https://ws.example.com".into(),
            }])
            .unwrap();
        fs::create_dir_all(&report_dir).unwrap();
        fs::write(report_dir.join("stale.html"), "old").unwrap();

        let summary = generate(&results_dir, &report_dir, "2026-10-18_14-03-05").unwrap();
        assert_eq!(summary.failed, 1);

        let html = fs::read_to_string(report_dir.join("index.html")).unwrap();
        assert!(html.contains("2026-10-18_14-03-05"));
        assert!(html.contains("Step 1 falhou com status 401"));
        assert!(html.contains("Tempo de Resposta (Step 1)"));
        assert!(html.contains("ws.example.com"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(!report_dir.join("stale.html").exists());

        let data: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_dir.join("data/results.json")).unwrap())
                .unwrap();
        assert_eq!(data[0]["status"], "failed");
    }

    #[test]
    fn empty_results_still_produce_a_report() {
        let root = tempfile::tempdir().unwrap();
        let report_dir = root.path().join("report");
        let summary = generate(&root.path().join("none"), &report_dir, "local").unwrap();
        assert_eq!(summary.total, 0);
        assert!(report_dir.join("index.html").exists());
    }

    #[test]
    fn duration_filter_switches_to_seconds() {
        assert_eq!(filters::duration(&250).unwrap(), "250ms");
        assert_eq!(filters::duration(&1500).unwrap(), "1.50s");
    }
}
