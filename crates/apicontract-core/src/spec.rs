//! Specification document model (OpenAPI/Swagger dialect, examples-driven)
//!
//! Only the fields the synthesizer reads are modeled. Optional sections
//! default to empty so the walker never has to check for presence, except
//! `responses` and `examples`, whose absence is a configuration error.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Root specification document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// Prefix prepended to every concrete endpoint
    #[serde(default, rename = "basePath")]
    pub base_path: String,

    /// Path template → path item
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
}

/// Everything declared under one path template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// Parameters shared by every operation on this path
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Method key (as written in the document) → operation
    #[serde(flatten)]
    pub operations: BTreeMap<String, Operation>,
}

/// Operation descriptor for one (path, method).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Status code string → response. `None` means the key was missing.
    #[serde(default, deserialize_with = "deserialize_responses")]
    pub responses: Option<BTreeMap<String, ResponseSpec>>,
}

/// Accepts status keys written as strings or as bare integers (YAML `200:`).
fn deserialize_responses<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, ResponseSpec>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<StatusKey, ResponseSpec>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|m| m.into_iter().map(|(k, v)| (k.0, v)).collect()))
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct StatusKey(String);

impl<'de> Deserialize<'de> for StatusKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl serde::de::Visitor<'_> for KeyVisitor {
            type Value = StatusKey;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a status code string or integer")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<StatusKey, E> {
                Ok(StatusKey(v.to_string()))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<StatusKey, E> {
                Ok(StatusKey(v.to_string()))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<StatusKey, E> {
                Ok(StatusKey(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

/// One declared response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub examples: Option<ResponseExamples>,
}

/// Example bundle attached to a response.
///
/// ```json
/// {
///   "request": {"name": "widget"},
///   "response": {"id": "${number}", "name": "widget"},
///   "path": "/widgets/does-not-exist",
///   "query": "?verbose=true",
///   "response_limit": [{"id": 1}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseExamples {
    /// Request body sent for methods that carry one
    #[serde(default)]
    pub request: Option<Value>,

    /// Expected response body template
    #[serde(default)]
    pub response: Value,

    /// Literal endpoint overriding the templated path
    #[serde(default)]
    pub path: Option<String>,

    /// Literal query string appended as-is
    #[serde(default)]
    pub query: Option<String>,

    /// `response_<name>` overrides, plus any other key the author added
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ResponseExamples {
    /// Expected body for the variant named `name` (`response_<name>`), if declared.
    #[must_use]
    pub fn override_for(&self, name: &str) -> Option<&Value> {
        self.extra.get(&format!("response_{name}"))
    }
}

/// Parameter descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParamLocation,

    #[serde(default)]
    pub required: bool,

    /// Literal example value
    #[serde(default)]
    pub example: Option<Value>,

    /// Named scenario → example value
    #[serde(default)]
    pub examples: BTreeMap<String, Value>,
}

/// Where a parameter travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
    #[serde(other)]
    Other,
}

/// Render a JSON example the way it appears in a URL: strings verbatim,
/// everything else as JSON text.
#[must_use]
pub fn value_to_param_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Merge path-level and operation-level parameters.
///
/// Operation-level entries replace path-level ones with the same name and location.
#[must_use]
pub fn effective_parameters(item: &PathItem, operation: &Operation) -> Vec<Parameter> {
    let mut merged: Vec<Parameter> = item
        .parameters
        .iter()
        .filter(|shared| {
            !operation
                .parameters
                .iter()
                .any(|own| own.name == shared.name && own.location == shared.location)
        })
        .cloned()
        .collect();
    merged.extend(operation.parameters.iter().cloned());
    merged
}
