//! Run report: interchange type, JSON Schema export, and on-disk layout
//!
//! ```text
//! <report_dir>/
//! ├── summary.json
//! ├── GET__widgets__id_.jsonl
//! └── POST__widgets.jsonl
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::verdict::{CaseOutcome, Verdict};

/// Headers masked before anything is written to disk.
const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "x-auth-token",
    "cookie",
    "proxy-authorization",
];

/// Replacement value for masked headers
pub const MASK: &str = "***";

/// Maximum characters kept from the operation label in a filename.
const MAX_FILENAME_LEN: usize = 200;

/// Everything one contract run produced.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    /// Server the cases ran against
    pub base_url: String,
    /// Specification document used
    pub spec: String,
    pub verdict: Verdict,
    pub stats: RunStats,
    /// Wall-clock duration of the run
    pub duration_secs: f64,
    /// One entry per executed case, in synthesis order
    pub outcomes: Vec<CaseOutcome>,
}

/// Case counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunStats {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub transport_errors: u64,
}

impl RunStats {
    #[must_use]
    pub fn from_outcomes(outcomes: &[CaseOutcome]) -> Self {
        let mut stats = Self::default();
        for o in outcomes {
            stats.total += 1;
            match &o.failure {
                None => stats.passed += 1,
                Some(f) if f.is_transport() => stats.transport_errors += 1,
                Some(_) => stats.failed += 1,
            }
        }
        stats
    }
}

impl RunReport {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        spec: impl Into<String>,
        outcomes: Vec<CaseOutcome>,
        duration_secs: f64,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            spec: spec.into(),
            verdict: Verdict::judge(&outcomes),
            stats: RunStats::from_outcomes(&outcomes),
            duration_secs,
            outcomes,
        }
    }

    /// Outcomes that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }
}

/// JSON Schema for [`RunReport`], pretty-printed.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(RunReport);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// Listing of what [`write_report`] produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportIndex {
    pub report_dir: PathBuf,
    pub files: Vec<ReportFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFile {
    pub operation: String,
    pub file: String,
    pub count: u64,
}

/// Write `summary.json` plus one JSONL file of outcomes per operation.
///
/// # Errors
///
/// Returns error if the directory cannot be created or a file cannot be written.
pub fn write_report(
    report: &RunReport,
    report_dir: &Path,
    mask_headers: bool,
) -> Result<ReportIndex, ReportError> {
    std::fs::create_dir_all(report_dir)
        .map_err(|e| ReportError::Io(format!("create {}: {e}", report_dir.display())))?;

    let mut groups: BTreeMap<&str, Vec<&CaseOutcome>> = BTreeMap::new();
    for outcome in &report.outcomes {
        groups.entry(outcome.operation.as_str()).or_default().push(outcome);
    }

    let mut files = Vec::new();
    for (operation, outcomes) in groups {
        let filename = sanitize_filename(operation);
        let filepath = report_dir.join(&filename);
        let file = std::fs::File::create(&filepath)
            .map_err(|e| ReportError::Io(format!("create {}: {e}", filepath.display())))?;
        let mut writer = std::io::BufWriter::new(file);

        for outcome in &outcomes {
            let line = if mask_headers {
                serde_json::to_string(&mask_outcome(outcome))
            } else {
                serde_json::to_string(outcome)
            }
            .map_err(|e| ReportError::Serialize(e.to_string()))?;
            writeln!(writer, "{line}")
                .map_err(|e| ReportError::Io(format!("write {}: {e}", filepath.display())))?;
        }
        writer
            .flush()
            .map_err(|e| ReportError::Io(format!("flush {}: {e}", filepath.display())))?;

        files.push(ReportFile {
            operation: operation.to_string(),
            file: filename,
            count: outcomes.len() as u64,
        });
    }

    let summary = serde_json::json!({
        "base_url": report.base_url,
        "spec": report.spec,
        "verdict": report.verdict,
        "stats": report.stats,
        "duration_secs": report.duration_secs,
        "files": files,
    });
    let summary_path = report_dir.join("summary.json");
    let summary_json =
        serde_json::to_string_pretty(&summary).map_err(|e| ReportError::Serialize(e.to_string()))?;
    std::fs::write(&summary_path, summary_json)
        .map_err(|e| ReportError::Io(format!("write {}: {e}", summary_path.display())))?;

    Ok(ReportIndex {
        report_dir: report_dir.to_path_buf(),
        files,
    })
}

/// "POST /api/widgets/{id}" → "POST__api_widgets__id_.jsonl"
fn sanitize_filename(operation: &str) -> String {
    let sanitized: String = operation
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' => c,
            _ => '_',
        })
        .collect();
    format!("{sanitized}.jsonl")
}

/// Case-insensitive match against [`SENSITIVE_HEADERS`].
#[must_use]
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|&h| name.eq_ignore_ascii_case(h))
}

pub(crate) fn mask_outcome(outcome: &CaseOutcome) -> CaseOutcome {
    let mut masked = outcome.clone();
    for (key, value) in &mut masked.request.headers {
        if is_sensitive_header(key) {
            *value = MASK.to_string();
        }
    }
    masked
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{Failure, RequestSnapshot, VerdictStatus};

    fn outcome(operation: &str, failure: Option<Failure>) -> CaseOutcome {
        CaseOutcome {
            case_id: 0,
            operation: operation.into(),
            description: "case".into(),
            request: RequestSnapshot {
                method: "POST".into(),
                url: "http://localhost:8080/widgets".into(),
                headers: BTreeMap::from([
                    ("Authorization".into(), "Bearer secret-token".into()),
                    ("Content-Type".into(), "application/json".into()),
                ]),
                body: Some(r#"{"name":"w"}"#.into()),
            },
            response: None,
            failure,
        }
    }

    fn sample_report() -> RunReport {
        RunReport::new(
            "http://localhost:8080",
            "openapi.json",
            vec![
                outcome("POST /widgets", None),
                outcome(
                    "POST /widgets",
                    Some(Failure::StatusMismatch {
                        expected: 201,
                        actual: 400,
                    }),
                ),
                outcome(
                    "GET /health",
                    Some(Failure::Transport {
                        message: "refused".into(),
                    }),
                ),
            ],
            0.25,
        )
    }

    #[test]
    fn stats_from_outcomes() {
        let report = sample_report();
        assert_eq!(
            report.stats,
            RunStats {
                total: 3,
                passed: 1,
                failed: 1,
                transport_errors: 1,
            }
        );
        assert_eq!(report.verdict.status, VerdictStatus::Fail);
        assert_eq!(report.failures().count(), 2);
    }

    #[test]
    fn sanitize_complex_path() {
        assert_eq!(
            sanitize_filename("POST /api/v2/users/{id}"),
            "POST__api_v2_users__id_.jsonl"
        );
    }

    #[test]
    fn sensitive_headers_case_insensitive() {
        assert!(is_sensitive_header("Authorization"));
        assert!(is_sensitive_header("X-API-KEY"));
        assert!(!is_sensitive_header("Content-Type"));
    }

    #[test]
    fn write_report_groups_and_masks() {
        let dir = tempfile::tempdir().unwrap();
        let index = write_report(&sample_report(), dir.path(), true).unwrap();

        assert_eq!(index.files.len(), 2);
        assert_eq!(index.files[0].operation, "GET /health");
        assert_eq!(index.files[0].count, 1);
        assert_eq!(index.files[1].operation, "POST /widgets");
        assert_eq!(index.files[1].count, 2);

        let content = std::fs::read_to_string(dir.path().join("POST__widgets.jsonl")).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: CaseOutcome = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.request.headers["Authorization"], "***");
        assert_eq!(parsed.request.headers["Content-Type"], "application/json");

        let summary: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(summary["stats"]["total"], 3);
        assert_eq!(summary["verdict"]["status"], "fail");
    }

    #[test]
    fn write_report_unmasked() {
        let dir = tempfile::tempdir().unwrap();
        write_report(&sample_report(), dir.path(), false).unwrap();
        let content = std::fs::read_to_string(dir.path().join("GET__health.jsonl")).unwrap();
        let parsed: CaseOutcome = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed.request.headers["Authorization"], "Bearer secret-token");
    }

    #[test]
    fn schema_names_report() {
        let schema: serde_json::Value = serde_json::from_str(&generate_schema()).unwrap();
        assert_eq!(schema["title"], "RunReport");
    }
}
