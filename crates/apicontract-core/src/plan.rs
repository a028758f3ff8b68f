//! Dry run plan types and config validation
//!
//! Describes which test cases a run *would* execute without sending any
//! request. Used by `apicontract list` and for pre-flight checks in CI.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::fixture::TestCase;

// ── Plan types ──

/// Complete dry run plan: synthesized cases and config warnings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Cases grouped by operation, in synthesis order
    pub operations: Vec<OperationPlan>,
    /// Number of test cases that would run
    pub total_cases: usize,
    /// Config/spec validation results
    pub validations: Vec<Validation>,
}

/// Cases planned for a single operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OperationPlan {
    /// Operation label, e.g. "GET /widgets/{id}"
    pub operation: String,
    pub cases: Vec<PlannedCase>,
}

/// One planned case.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlannedCase {
    pub id: usize,
    /// Concrete request line, e.g. "GET /api/widgets/7"
    pub request: String,
    pub expected_status: u16,
    pub description: String,
}

/// A validation check result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl Plan {
    /// Group synthesized cases by operation, keeping first-seen order.
    #[must_use]
    pub fn new(cases: &[TestCase], validations: Vec<Validation>) -> Self {
        let mut operations: Vec<OperationPlan> = Vec::new();
        for case in cases {
            let planned = PlannedCase {
                id: case.id,
                request: case.request_line(),
                expected_status: case.fixture.response.status,
                description: case.description.clone(),
            };
            match operations.last_mut() {
                Some(op) if op.operation == case.operation => op.cases.push(planned),
                _ => operations.push(OperationPlan {
                    operation: case.operation.clone(),
                    cases: vec![planned],
                }),
            }
        }
        Self {
            operations,
            total_cases: cases.len(),
            validations,
        }
    }
}

// ── Config validation ──

/// Lowercase fragments of header values copied from an example and never filled in.
const UNFILLED_MARKERS: &[&str] = &[
    "your-token",
    "your_token",
    "changeme",
    "replace-me",
    "replace_me",
];

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: String) -> Self {
        Self {
            check: check.to_string(),
            status,
            message,
        }
    }
}

/// Pre-flight checks on a config; nothing is sent.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let spec = config.spec.display();
    let mut checks = vec![if config.spec.is_file() {
        Validation::new("spec", ValidationStatus::Ok, format!("spec: {spec}"))
    } else {
        Validation::new(
            "spec",
            ValidationStatus::Error,
            format!("spec: {spec} is not a readable file"),
        )
    }];

    let scheme_ok = ["http://", "https://"]
        .iter()
        .any(|scheme| config.base_url.starts_with(scheme));
    checks.push(if scheme_ok {
        Validation::new(
            "base_url",
            ValidationStatus::Ok,
            format!("base_url: {}", config.base_url),
        )
    } else {
        Validation::new(
            "base_url",
            ValidationStatus::Warning,
            format!("base_url: {} has no http(s) scheme", config.base_url),
        )
    });

    let unfilled: Vec<&String> = config
        .headers
        .iter()
        .filter(|(_, value)| looks_unfilled(value))
        .map(|(key, _)| key)
        .collect();
    if unfilled.is_empty() {
        checks.push(Validation::new(
            "headers",
            ValidationStatus::Ok,
            format!("headers: {} configured", config.headers.len()),
        ));
    } else {
        checks.extend(unfilled.into_iter().map(|key| {
            Validation::new(
                "headers",
                ValidationStatus::Warning,
                format!("headers: {key} still holds an example value"),
            )
        }));
    }

    if config.timeout_secs == 0 {
        checks.push(Validation::new(
            "timeout",
            ValidationStatus::Warning,
            "timeout_secs: 0, every request will time out".into(),
        ));
    }

    checks
}

/// `<...>` templates or a known "fill me in" marker.
fn looks_unfilled(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    let templated = lower
        .find('<')
        .is_some_and(|open| lower[open..].contains('>'));
    templated || UNFILLED_MARKERS.iter().any(|m| lower.contains(m))
}

// ── Display helpers ──

impl Plan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Dry run: {} operations, {} test cases planned\n",
            self.operations.len(),
            self.total_cases,
        ));

        for op in &self.operations {
            lines.push(format!("{} ({} cases):", op.operation, op.cases.len()));
            for case in &op.cases {
                lines.push(format!(
                    "  [{}] {} -> {}  {}",
                    case.id, case.request, case.expected_status, case.description
                ));
            }
            lines.push(String::new());
        }

        lines.push("Config validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}
