//! Verdict - turns per-case outcomes into a pass/fail judgement and exit code

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::CaseOutcome;

/// Exit code: every case passed
pub const EXIT_PASS: i32 = 0;
/// Exit code: at least one contract assertion failed
pub const EXIT_ASSERTION: i32 = 1;
/// Exit code: at least one request failed at the transport level
pub const EXIT_TRANSPORT: i32 = 2;
/// Exit code: tool error (config, spec, synthesis, nothing executed)
pub const EXIT_TOOL: i32 = 3;

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

impl Verdict {
    /// Judge a run.
    ///
    /// PASS requires at least one executed case and no failures. Transport
    /// errors outrank assertion failures in the exit code.
    #[must_use]
    pub fn judge(outcomes: &[CaseOutcome]) -> Self {
        if outcomes.is_empty() {
            return Self {
                status: VerdictStatus::Fail,
                exit_code: EXIT_TOOL,
                reason: "No test cases were executed".to_string(),
            };
        }

        let transport = outcomes
            .iter()
            .filter(|o| o.failure.as_ref().is_some_and(|f| f.is_transport()))
            .count();
        let failed = outcomes.iter().filter(|o| !o.passed()).count() - transport;

        if failed == 0 && transport == 0 {
            return Self {
                status: VerdictStatus::Pass,
                exit_code: EXIT_PASS,
                reason: format!("All {} test cases passed", outcomes.len()),
            };
        }

        let mut parts = Vec::new();
        if failed > 0 {
            parts.push(format!("{failed} of {} test cases failed", outcomes.len()));
        }
        if transport > 0 {
            parts.push(format!("{transport} transport errors"));
        }

        Self {
            status: VerdictStatus::Fail,
            exit_code: if transport > 0 {
                EXIT_TRANSPORT
            } else {
                EXIT_ASSERTION
            },
            reason: parts.join("; "),
        }
    }
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
