//! HTTP file generator - converts failing cases to .http format

use crate::report::mask_outcome;
use crate::verdict::{CaseOutcome, RequestSnapshot};

/// Generate .http file content from failing outcomes
///
/// Credential headers are written masked.
pub fn to_http_file<'a>(
    failures: impl IntoIterator<Item = &'a CaseOutcome>,
    base_url_var: &str,
) -> String {
    let failures: Vec<&CaseOutcome> = failures.into_iter().collect();
    let mut lines = Vec::new();

    lines.push(format!(
        "# Auto-generated reproduction cases ({} failures)",
        failures.len()
    ));
    lines.push(format!("# Base URL variable: {{{{{base_url_var}}}}}"));
    lines.push(String::new());

    for outcome in failures {
        let reason = outcome
            .failure
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        lines.push(format!("### [{}] {}", outcome.case_id, outcome.description));
        lines.push(format!("# {reason}"));

        let mut request = mask_outcome(outcome).request;
        if !request.url.starts_with("http") {
            request.url = format!("{{{{{base_url_var}}}}}{}", request.url);
        }
        lines.push(request_to_http(&request, None));

        lines.push(String::new());
    }

    lines.join("\n")
}

/// Generate a single request as .http format
pub fn request_to_http(request: &RequestSnapshot, comment: Option<&str>) -> String {
    let mut lines = Vec::new();

    if let Some(c) = comment {
        lines.push(format!("### {c}"));
    }

    lines.push(format!("{} {}", request.method, request.url));

    for (key, value) in &request.headers {
        if !matches!(key.to_lowercase().as_str(), "host" | "content-length") {
            lines.push(format!("{key}: {value}"));
        }
    }

    if let Some(body) = &request.body {
        lines.push(String::new());
        lines.push(body.clone());
    }

    lines.join("\n")
}
