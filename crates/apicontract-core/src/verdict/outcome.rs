//! Per-case outcomes and failure representation

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fixture::TestCase;
use crate::reconcile::{Placeholder, ReconcileError};

/// Why a test case failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// Live status differs from the declared one
    StatusMismatch { expected: u16, actual: u16 },
    /// A placeholder met a live value of another type
    TypeMismatch {
        pointer: String,
        expected: String,
        found: String,
    },
    /// Reconciled expected body differs from the live body
    BodyMismatch { expected: Value, actual: Value },
    /// The request never produced a response
    Transport { message: String },
}

impl Failure {
    /// Transport failures say nothing about the contract itself.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Short machine-friendly label
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::StatusMismatch { .. } => "status_mismatch",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::BodyMismatch { .. } => "body_mismatch",
            Self::Transport { .. } => "transport",
        }
    }
}

impl From<ReconcileError> for Failure {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::TypeMismatch {
                pointer,
                expected,
                found,
            } => Self::TypeMismatch {
                pointer,
                expected: Placeholder::token(expected).to_string(),
                found: found.to_string(),
            },
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StatusMismatch { expected, actual } => {
                write!(f, "expected status {expected}, got {actual}")
            }
            Self::TypeMismatch {
                pointer,
                expected,
                found,
            } => {
                let at = if pointer.is_empty() { "/" } else { pointer };
                write!(f, "type mismatch at {at}: expected {expected}, found {found}")
            }
            Self::BodyMismatch { expected, actual } => {
                write!(f, "body mismatch: expected {expected}, got {actual}")
            }
            Self::Transport { message } => write!(f, "transport error: {message}"),
        }
    }
}

/// Snapshot of the HTTP request that was sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Snapshot of the HTTP response received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseSnapshot {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub latency_ms: u64,
}

/// Result of executing one test case. Terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaseOutcome {
    pub case_id: usize,
    pub operation: String,
    pub description: String,
    pub request: RequestSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSnapshot>,
    /// `None` means the case passed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl CaseOutcome {
    /// Start an outcome for `case`; the caller fills in response and failure.
    #[must_use]
    pub fn for_case(case: &TestCase, request: RequestSnapshot) -> Self {
        Self {
            case_id: case.id,
            operation: case.operation.clone(),
            description: case.description.clone(),
            request,
            response: None,
            failure: None,
        }
    }

    #[must_use]
    pub fn with_response(mut self, response: ResponseSnapshot) -> Self {
        self.response = Some(response);
        self
    }

    #[must_use]
    pub fn with_failure(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }
}
