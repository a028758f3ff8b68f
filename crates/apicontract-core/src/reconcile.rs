//! Expected-response reconciliation
//!
//! Walks the expected template depth-first and produces a concrete body that
//! can be compared with the live one by plain equality:
//!
//! - nested objects/arrays present on both sides are walked recursively
//! - typed placeholders (`${number}`, `${string}`, `${boolean}`) take the live
//!   value when its type matches, otherwise reconciliation fails
//! - every other template value is kept literally
//!
//! Only the template's keys are visited. Keys the live body has in addition
//! are dropped from the result, and [`project`] drops them from the live body
//! before comparison, so they are never asserted: examples in the document
//! may describe a partial body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed "any value of this type" token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placeholder {
    Number,
    String,
    Boolean,
}

impl Placeholder {
    /// Recognize an exact placeholder token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "${number}" => Some(Self::Number),
            "${string}" => Some(Self::String),
            "${boolean}" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Placeholder carried by a template value, if any.
    #[must_use]
    pub fn from_value(v: &Value) -> Option<Self> {
        v.as_str().and_then(Self::parse)
    }

    #[must_use]
    pub fn accepts(self, v: &Value) -> bool {
        match self {
            Self::Number => v.is_number(),
            Self::String => v.is_string(),
            Self::Boolean => v.is_boolean(),
        }
    }

    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Number => "${number}",
            Self::String => "${string}",
            Self::Boolean => "${boolean}",
        }
    }
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("type mismatch at '{pointer}': expected {expected}, found {found}")]
    TypeMismatch {
        /// JSON pointer into the response body ("" for the root)
        pointer: String,
        expected: Placeholder,
        found: &'static str,
    },
}

/// Reconcile a live body against an expected template.
///
/// The template is left untouched; a fresh value is returned on every call.
///
/// # Errors
///
/// Returns [`ReconcileError::TypeMismatch`] when a placeholder's position
/// holds a value of another type, or is absent from the live body.
pub fn reconcile(actual: &Value, template: &Value) -> Result<Value, ReconcileError> {
    let mut pointer = String::new();
    reconcile_at(Some(actual), template, &mut pointer)
}

fn reconcile_at(
    actual: Option<&Value>,
    template: &Value,
    pointer: &mut String,
) -> Result<Value, ReconcileError> {
    match (template, actual) {
        (Value::Object(tmpl), Some(Value::Object(live))) => {
            let mut out = Map::with_capacity(tmpl.len());
            for (key, sub) in tmpl {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&escape_pointer_token(key));
                let resolved = reconcile_at(live.get(key), sub, pointer)?;
                pointer.truncate(len);
                out.insert(key.clone(), resolved);
            }
            Ok(Value::Object(out))
        }
        (Value::Array(tmpl), Some(Value::Array(live))) => {
            let mut out = Vec::with_capacity(tmpl.len());
            for (idx, sub) in tmpl.iter().enumerate() {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&idx.to_string());
                let resolved = reconcile_at(live.get(idx), sub, pointer)?;
                pointer.truncate(len);
                out.push(resolved);
            }
            Ok(Value::Array(out))
        }
        _ => resolve_leaf(actual, template, pointer),
    }
}

fn resolve_leaf(
    actual: Option<&Value>,
    template: &Value,
    pointer: &str,
) -> Result<Value, ReconcileError> {
    let Some(placeholder) = Placeholder::from_value(template) else {
        return Ok(template.clone());
    };
    match actual {
        Some(v) if placeholder.accepts(v) => Ok(v.clone()),
        other => Err(ReconcileError::TypeMismatch {
            pointer: pointer.to_string(),
            expected: placeholder,
            found: other.map_or("missing", json_type_name),
        }),
    }
}

/// Restrict a live body to the shape of `template`.
///
/// Object keys the template does not declare are dropped; arrays keep every
/// live element so length differences still show. The result is what the
/// reconciled expected body is compared against.
#[must_use]
pub fn project(actual: &Value, template: &Value) -> Value {
    match (template, actual) {
        (Value::Object(tmpl), Value::Object(live)) => Value::Object(
            tmpl.iter()
                .filter_map(|(key, sub)| live.get(key).map(|v| (key.clone(), project(v, sub))))
                .collect(),
        ),
        (Value::Array(tmpl), Value::Array(live)) => Value::Array(
            live.iter()
                .enumerate()
                .map(|(idx, v)| tmpl.get(idx).map_or_else(|| v.clone(), |sub| project(v, sub)))
                .collect(),
        ),
        _ => actual.clone(),
    }
}

/// Structural equality where numbers compare by value (`10` equals `10.0`).
#[must_use]
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, v)| y.get(key).is_some_and(|w| json_eq(v, w)))
        }
        _ => a == b,
    }
}

/// RFC 6901 escaping for one reference token.
fn escape_pointer_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// JSON type name of a value, for diagnostics.
#[must_use]
pub fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_placeholder_takes_live_value() {
        let out = reconcile(&json!({"count": 5}), &json!({"count": "${number}"})).unwrap();
        assert_eq!(out, json!({"count": 5}));
    }

    #[test]
    fn number_placeholder_rejects_string() {
        let err = reconcile(&json!({"count": "5"}), &json!({"count": "${number}"})).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::TypeMismatch {
                pointer: "/count".into(),
                expected: Placeholder::Number,
                found: "string",
            }
        );
    }

    #[test]
    fn string_and_boolean_placeholders() {
        let out = reconcile(
            &json!({"name": "w", "active": false}),
            &json!({"name": "${string}", "active": "${boolean}"}),
        )
        .unwrap();
        assert_eq!(out, json!({"name": "w", "active": false}));

        assert!(reconcile(&json!({"active": 1}), &json!({"active": "${boolean}"})).is_err());
        assert!(reconcile(&json!({"name": null}), &json!({"name": "${string}"})).is_err());
    }

    #[test]
    fn extra_live_keys_are_ignored() {
        let out = reconcile(&json!({"a": 1, "extra": true}), &json!({"a": "${number}"})).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn nested_objects_recurse() {
        let out = reconcile(
            &json!({"user": {"id": 3}}),
            &json!({"user": {"id": "${number}"}}),
        )
        .unwrap();
        assert_eq!(out, json!({"user": {"id": 3}}));
    }

    #[test]
    fn arrays_recurse_by_index() {
        let out = reconcile(
            &json!([{"id": 1, "n": "a"}, {"id": 2, "n": "b"}]),
            &json!([{"id": "${number}", "n": "a"}, {"id": "${number}", "n": "b"}]),
        )
        .unwrap();
        assert_eq!(out, json!([{"id": 1, "n": "a"}, {"id": 2, "n": "b"}]));
    }

    #[test]
    fn pointer_reports_nested_position() {
        let err = reconcile(
            &json!({"items": [{"id": 1}, {"id": "x"}]}),
            &json!({"items": [{"id": "${number}"}, {"id": "${number}"}]}),
        )
        .unwrap_err();
        let ReconcileError::TypeMismatch { pointer, .. } = err;
        assert_eq!(pointer, "/items/1/id");
    }

    #[test]
    fn pointer_escapes_special_keys() {
        let err = reconcile(&json!({"a/b": "x"}), &json!({"a/b": "${number}"})).unwrap_err();
        let ReconcileError::TypeMismatch { pointer, .. } = err;
        assert_eq!(pointer, "/a~1b");
    }

    #[test]
    fn missing_key_with_placeholder_is_mismatch() {
        let err = reconcile(&json!({}), &json!({"id": "${number}"})).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::TypeMismatch {
                pointer: "/id".into(),
                expected: Placeholder::Number,
                found: "missing",
            }
        );
    }

    #[test]
    fn missing_literal_key_survives_for_equality() {
        let out = reconcile(&json!({}), &json!({"name": "widget"})).unwrap();
        assert_eq!(out, json!({"name": "widget"}));
        assert_ne!(out, json!({}));
    }

    #[test]
    fn literal_values_are_kept_even_when_different() {
        let out = reconcile(&json!({"name": "gadget"}), &json!({"name": "widget"})).unwrap();
        assert_eq!(out, json!({"name": "widget"}));
    }

    #[test]
    fn structure_kind_mismatch_keeps_template() {
        let out = reconcile(&json!({"user": [1]}), &json!({"user": {"id": "${number}"}})).unwrap();
        assert_eq!(out, json!({"user": {"id": "${number}"}}));
    }

    #[test]
    fn root_placeholder() {
        assert_eq!(reconcile(&json!(12), &json!("${number}")).unwrap(), json!(12));
        assert!(reconcile(&json!("12"), &json!("${number}")).is_err());
    }

    #[test]
    fn template_is_not_mutated() {
        let template = json!({"id": "${number}"});
        let before = template.clone();
        let first = reconcile(&json!({"id": 1}), &template).unwrap();
        let second = reconcile(&json!({"id": 2}), &template).unwrap();
        assert_eq!(template, before);
        assert_eq!(first, json!({"id": 1}));
        assert_eq!(second, json!({"id": 2}));
    }

    #[test]
    fn projection_drops_undeclared_keys() {
        let template = json!({"a": "${number}", "nested": {"b": 1}});
        let live = json!({"a": 1, "extra": true, "nested": {"b": 1, "c": 2}});
        assert_eq!(project(&live, &template), json!({"a": 1, "nested": {"b": 1}}));
        assert_eq!(
            project(&live, &template),
            reconcile(&live, &template).unwrap()
        );
    }

    #[test]
    fn projection_keeps_missing_keys_missing() {
        let template = json!({"a": 1, "b": 2});
        assert_eq!(project(&json!({"a": 1}), &template), json!({"a": 1}));
        assert_ne!(
            project(&json!({"a": 1}), &template),
            reconcile(&json!({"a": 1}), &template).unwrap()
        );
    }

    #[test]
    fn projection_keeps_array_length() {
        let template = json!([{"id": "${number}"}]);
        let live = json!([{"id": 1, "x": 0}, {"id": 2}]);
        assert_eq!(project(&live, &template), json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(json_eq(&json!({"price": 10}), &json!({"price": 10.0})));
        assert!(json_eq(&json!([1, -2, 3.5]), &json!([1.0, -2.0, 3.5])));
        assert!(!json_eq(&json!({"price": 10}), &json!({"price": 10.5})));
        assert!(json_eq(&json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn json_eq_is_structural() {
        assert!(!json_eq(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!json_eq(&json!([1]), &json!([1, 1])));
        assert!(!json_eq(&json!("10"), &json!(10)));
        assert!(json_eq(&json!({"a": [true, null]}), &json!({"a": [true, null]})));
    }

    #[test]
    fn near_miss_tokens_are_literal() {
        assert_eq!(Placeholder::parse("${Number}"), None);
        assert_eq!(Placeholder::parse(" ${number}"), None);
        let out = reconcile(&json!({"a": 1}), &json!({"a": "${int}"})).unwrap();
        assert_eq!(out, json!({"a": "${int}"}));
    }
}
