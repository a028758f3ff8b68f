//! Test case execution: one request, status assertion, body reconciliation
//!
//! No retries. A transport error or failed assertion ends that case only.

use std::collections::BTreeMap;

use serde_json::Value;

use apicontract_core::fixture::Fixture;
use apicontract_core::verdict::ResponseSnapshot;
use apicontract_core::{CaseOutcome, Failure, TestCase, json_eq, project, reconcile};

use crate::client::{HttpClient, HttpRequest, HttpResponse};

/// Maximum body bytes kept in outcome snapshots
const MAX_BODY_BYTES: usize = 4096;

/// Executes test cases against one service instance.
pub struct Executor<'a, C: HttpClient> {
    client: &'a C,
    base_url: &'a str,
    /// Layered over each fixture's headers
    headers: &'a BTreeMap<String, String>,
}

impl<'a, C: HttpClient> Executor<'a, C> {
    #[must_use]
    pub fn new(client: &'a C, base_url: &'a str, headers: &'a BTreeMap<String, String>) -> Self {
        Self {
            client,
            base_url,
            headers,
        }
    }

    /// Resolve the request a case sends.
    #[must_use]
    pub fn build_request(&self, case: &TestCase) -> HttpRequest {
        let fixture = &case.fixture.request;
        let mut headers = fixture.headers.clone();
        // Header names are case-insensitive: a configured name replaces the
        // standard one however either is spelled.
        headers.retain(|name, _| {
            !self
                .headers
                .keys()
                .any(|configured| configured.eq_ignore_ascii_case(name))
        });
        headers.extend(self.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        HttpRequest {
            method: fixture.method,
            url: format!("{}{}", self.base_url.trim_end_matches('/'), fixture.path),
            headers,
            body: if fixture.method.has_body() {
                fixture.body.clone()
            } else {
                None
            },
        }
    }

    /// Run one case to its terminal outcome.
    pub fn execute(&self, case: &TestCase) -> CaseOutcome {
        let request = self.build_request(case);
        let outcome = CaseOutcome::for_case(case, request.snapshot());

        let response = match self.client.send(&request) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(case = case.id, url = %request.url, error = %e, "request failed");
                return outcome.with_failure(Failure::Transport {
                    message: e.to_string(),
                });
            }
        };

        let outcome = outcome.with_response(snapshot_response(&response));
        let body = decode_body(&response.body);
        match check_response(&case.fixture, response.status, &body) {
            Ok(()) => {
                tracing::debug!(case = case.id, "passed");
                outcome
            }
            Err(failure) => {
                tracing::debug!(case = case.id, %failure, "failed");
                outcome.with_failure(failure)
            }
        }
    }
}

/// Assert a live response against a fixture.
///
/// Status first; the body is compared only when the status matched. Delete
/// responses are compared with the unmodified expected body, every other
/// method with the reconciled one (against the live body restricted to the
/// template's keys). Numbers compare by value.
///
/// # Errors
///
/// Returns the first [`Failure`] found.
pub fn check_response(fixture: &Fixture, status: u16, body: &Value) -> Result<(), Failure> {
    let expected_status = fixture.response.status;
    if status != expected_status {
        return Err(Failure::StatusMismatch {
            expected: expected_status,
            actual: status,
        });
    }

    let template = &fixture.response.body;
    let (expected, actual) = if fixture.request.method.reconciles_body() {
        (reconcile(body, template)?, project(body, template))
    } else {
        (template.clone(), body.clone())
    };

    if json_eq(&expected, &actual) {
        Ok(())
    } else {
        Err(Failure::BodyMismatch { expected, actual })
    }
}

/// Empty → `{}`, JSON → value, anything else → the text as a JSON string.
///
/// An empty body reads as an empty object, so documents declaring
/// `"response": {}` for 204s and deletions match.
#[must_use]
pub fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn snapshot_response(response: &HttpResponse) -> ResponseSnapshot {
    let body = &response.body;
    let stored = if body.is_empty() {
        None
    } else if body.len() <= MAX_BODY_BYTES {
        Some(body.clone())
    } else {
        let mut end = MAX_BODY_BYTES;
        while end > 0 && !body.is_char_boundary(end) {
            end -= 1;
        }
        Some(format!("{}…({} bytes total)", &body[..end], body.len()))
    };

    ResponseSnapshot {
        status_code: response.status,
        body: stored,
        latency_ms: u64::try_from(response.elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}
