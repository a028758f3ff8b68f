//! Specification file loading (JSON or YAML)

use std::path::Path;

use apicontract_core::Specification;

use crate::RunnerError;

/// Read and parse a specification document.
///
/// # Errors
///
/// Returns [`RunnerError::Io`] if the file cannot be read and
/// [`RunnerError::Parse`] if it is not a valid document.
pub fn load_spec(path: &Path) -> Result<Specification, RunnerError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RunnerError::Io(format!("{}: {e}", path.display())))?;
    parse_spec(path, &content)
}

/// Parse a specification from JSON or YAML.
///
/// Detection strategy: try extension first (`.yaml`/`.yml`), then fall back to
/// content sniffing (leading `{` → JSON, otherwise YAML).
///
/// # Errors
///
/// Returns [`RunnerError::Parse`] if the content does not deserialize.
pub fn parse_spec(path: &Path, content: &str) -> Result<Specification, RunnerError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => from_yaml(content),
        "json" => from_json(content),
        _ if content.trim_start().starts_with('{') => from_json(content),
        _ => from_yaml(content),
    }
}

fn from_json(content: &str) -> Result<Specification, RunnerError> {
    serde_json::from_str(content).map_err(|e| RunnerError::Parse(format!("Invalid JSON: {e}")))
}

fn from_yaml(content: &str) -> Result<Specification, RunnerError> {
    serde_yml::from_str(content).map_err(|e| RunnerError::Parse(format!("Invalid YAML: {e}")))
}
