//! Project configuration for contract runs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Config file names tried by [`Config::load_default`], in order.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[".apicontract.toml", ".apicontract.json", "apicontract.toml"];

/// Project configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Specification document path (JSON or YAML)
    pub spec: PathBuf,

    /// Base URL of the service under test
    pub base_url: String,

    /// Extra HTTP headers, layered over the standard ones
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Directory for run reports (not written when unset)
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: PathBuf::from("swagger.json"),
            base_url: "http://localhost:8080".to_string(),
            headers: BTreeMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            report_dir: None,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from the first default location that exists, or defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_default_in(Path::new("."))
    }

    /// [`Config::load_default`] relative to `dir`.
    ///
    /// # Errors
    ///
    /// Returns error if a config file exists but cannot be read or parsed
    pub fn load_default_in(dir: &Path) -> Result<Self, ConfigError> {
        for name in DEFAULT_CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# apicontract configuration

# Specification document (JSON or YAML) with response examples
spec = "swagger.json"

# Service under test
base_url = "http://localhost:8080"

# Per-request timeout in seconds
# timeout_secs = 10

# Write summary.json and per-operation JSONL outcomes here
# report_dir = ".apicontract/reports"

# Extra HTTP headers, layered over Content-Type/Authorization defaults
[headers]
# Authorization = "Bearer your-token-here"
# X-Request-Source = "contract-tests"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
