//! Fixtures: fully resolved request/expected-response pairs

use std::collections::BTreeMap;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Headers every synthesized request carries.
pub const STANDARD_HEADERS: &[(&str, &str)] = &[
    ("Content-Type", "application/json"),
    ("Authorization", "none"),
];

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Methods that send the example request body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Whether the live body goes through reconciliation before comparison.
    ///
    /// Deletions are compared against the unmodified expected body.
    #[must_use]
    pub const fn reconciles_body(self) -> bool {
        !matches!(self, Self::Delete)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a method key the executor cannot dispatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method '{0}'")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "patch" => Ok(Self::Patch),
            "delete" => Ok(Self::Delete),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

/// Request half of a fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RequestFixture {
    /// Concrete path including base path and query string
    pub path: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    /// Example request body (sent only for post/put/patch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Expected-response half of a fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseFixture {
    pub status: u16,
    pub description: String,
    /// Expected body template, possibly containing placeholders
    pub body: Value,
}

/// A self-contained request/expected-response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Fixture {
    pub request: RequestFixture,
    pub response: ResponseFixture,
}

/// One runnable contract test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TestCase {
    /// Position in synthesis order
    pub id: usize,
    /// Operation label, e.g. "GET /widgets/{id}"
    pub operation: String,
    /// Human-readable test name
    pub description: String,
    pub fixture: Fixture,
}

impl TestCase {
    /// Concrete request line, e.g. "GET /api/widgets/7".
    #[must_use]
    pub fn request_line(&self) -> String {
        format!(
            "{} {}",
            self.fixture.request.method, self.fixture.request.path
        )
    }
}

/// Standard request headers as an owned map.
#[must_use]
pub fn standard_headers() -> BTreeMap<String, String> {
    STANDARD_HEADERS
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
