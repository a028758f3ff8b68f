//! Endpoint construction: path-parameter substitution and query joining
//!
//! Values are trusted literals from the document; nothing is escaped.

use crate::spec::{ParamLocation, Parameter, ResponseExamples, value_to_param_string};

/// Error raised while resolving an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("path parameter '{name}' has no example")]
    MissingPathExample { name: String },
}

/// Build the concrete endpoint for one response.
///
/// Precedence: a literal `path` in the examples wins over templating; the
/// literal `query` is appended as-is; `extra_query` (a per-parameter
/// expansion fragment) is joined with [`append_query`].
///
/// # Errors
///
/// Returns [`EndpointError::MissingPathExample`] when the template names a
/// path parameter that has no example, or a required path parameter has none.
pub fn build_endpoint(
    template: &str,
    parameters: &[Parameter],
    examples: &ResponseExamples,
    extra_query: Option<&str>,
) -> Result<String, EndpointError> {
    let mut endpoint = if let Some(literal) = &examples.path {
        literal.clone()
    } else if template.contains('{') {
        substitute_path_params(template, parameters)?
    } else {
        template.to_string()
    };

    if let Some(query) = &examples.query {
        endpoint.push_str(query);
    }

    if let Some(fragment) = extra_query {
        endpoint = append_query(&endpoint, fragment);
    }

    Ok(endpoint)
}

fn substitute_path_params(template: &str, parameters: &[Parameter]) -> Result<String, EndpointError> {
    let mut endpoint = template.to_string();
    for param in parameters
        .iter()
        .filter(|p| p.location == ParamLocation::Path)
    {
        let placeholder = format!("{{{}}}", param.name);
        match &param.example {
            Some(example) => {
                endpoint = endpoint.replace(&placeholder, &value_to_param_string(example));
            }
            None if param.required || endpoint.contains(&placeholder) => {
                return Err(EndpointError::MissingPathExample {
                    name: param.name.clone(),
                });
            }
            None => {}
        }
    }
    Ok(endpoint)
}

/// Append a query fragment, choosing `?` or `&` by whether `path` already has a query.
///
/// One leading `?` on `fragment` is dropped first; an empty fragment is a no-op.
#[must_use]
pub fn append_query(path: &str, fragment: &str) -> String {
    let fragment = fragment.strip_prefix('?').unwrap_or(fragment);
    if fragment.is_empty() {
        return path.to_string();
    }
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}{fragment}")
}

/// Query fragment for one example value of query parameter `name`.
///
/// A string already shaped like `key=value` is used as the fragment itself.
#[must_use]
pub fn query_fragment(name: &str, example: &serde_json::Value) -> String {
    match example {
        serde_json::Value::String(s) if s.contains('=') => s.clone(),
        other => format!("{name}={}", value_to_param_string(other)),
    }
}

/// Join the document's base path with an endpoint.
#[must_use]
pub fn join_base_path(base_path: &str, endpoint: &str) -> String {
    format!("{}{endpoint}", base_path.trim_end_matches('/'))
}
