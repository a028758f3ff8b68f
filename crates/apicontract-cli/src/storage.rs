//! Run persistence - `--report-dir` / `report_dir`
//!
//! Layout:
//! - `summary.json` and one JSONL file per operation (see [`write_report`])
//! - `config.toml`, the config used, with sensitive headers masked
//! - `reproductions.http`, only when some case failed

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use apicontract_core::report::{MASK, ReportIndex, is_sensitive_header, write_report};
use apicontract_core::{Config, RunReport, to_http_file};

/// What [`save_run`] wrote.
pub struct SavedRun {
    pub index: ReportIndex,
    pub reproductions: Option<PathBuf>,
}

/// Persist a finished run under `dir`.
pub fn save_run(config: &Config, report: &RunReport, dir: &Path) -> Result<SavedRun> {
    let index = write_report(report, dir, true)
        .with_context(|| format!("writing report to {}", dir.display()))?;

    let config_toml = toml::to_string_pretty(&masked_config(config))
        .context("serializing config snapshot")?;
    std::fs::write(dir.join("config.toml"), config_toml)
        .with_context(|| format!("writing {}", dir.join("config.toml").display()))?;

    let reproductions = if report.failures().next().is_some() {
        let path = dir.join("reproductions.http");
        std::fs::write(&path, to_http_file(report.failures(), "base_url"))
            .with_context(|| format!("writing {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    Ok(SavedRun {
        index,
        reproductions,
    })
}

fn masked_config(config: &Config) -> Config {
    let mut masked = config.clone();
    for (key, value) in &mut masked.headers {
        if is_sensitive_header(key) {
            *value = MASK.to_string();
        }
    }
    masked
}
