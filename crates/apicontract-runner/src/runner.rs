//! Contract run orchestration: load, synthesize, filter, execute, report

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use apicontract_core::plan::{Validation, ValidationStatus, validate_config};
use apicontract_core::{CaseOutcome, Config, Plan, RunReport, TestCase, synthesize};

use crate::RunnerError;
use crate::client::{HttpClient, ReqwestClient};
use crate::executor::Executor;
use crate::loader::load_spec;

/// Runs every synthesized case of one specification against one service.
pub struct ContractRunner {
    spec_path: PathBuf,
    base_url: String,
    headers: BTreeMap<String, String>,
    timeout: Duration,
    /// Worker threads; 1 runs cases in order on the calling thread
    jobs: usize,
    /// Stop dispatching cases after the first failure
    stop_on_failure: bool,
    /// Substring a case's operation or description must contain
    filter: Option<String>,
}

impl ContractRunner {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            spec_path: config.spec.clone(),
            base_url: config.base_url.clone(),
            headers: config.headers.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            jobs: 1,
            stop_on_failure: false,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    #[must_use]
    pub fn with_stop_on_failure(mut self, stop: bool) -> Self {
        self.stop_on_failure = stop;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// Load the specification and synthesize the selected cases.
    ///
    /// # Errors
    ///
    /// Returns error if the spec cannot be read or parsed, or if synthesis fails.
    pub fn load_cases(&self) -> Result<Vec<TestCase>, RunnerError> {
        let spec = load_spec(&self.spec_path)?;
        let cases = synthesize(&spec)?;
        let total = cases.len();

        let selected: Vec<TestCase> = match &self.filter {
            Some(needle) => cases
                .into_iter()
                .filter(|c| {
                    c.operation.contains(needle.as_str()) || c.description.contains(needle.as_str())
                })
                .collect(),
            None => cases,
        };
        tracing::debug!(total, selected = selected.len(), "synthesized test cases");
        Ok(selected)
    }

    /// Generate a dry run plan: synthesize cases and validate config.
    /// No HTTP requests are sent.
    ///
    /// # Errors
    ///
    /// Returns error if the spec cannot be read, parsed, or synthesized.
    pub fn plan(&self, config: &Config) -> Result<Plan, RunnerError> {
        let mut validations = validate_config(config);
        let cases = self.load_cases()?;
        validations.push(Validation {
            check: "spec_parse".into(),
            status: if cases.is_empty() {
                ValidationStatus::Warning
            } else {
                ValidationStatus::Ok
            },
            message: format!("spec_parse: {} test cases synthesized", cases.len()),
        });
        Ok(Plan::new(&cases, validations))
    }

    /// Execute all selected cases with the blocking `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns error if the spec cannot be loaded or the HTTP client fails to build.
    pub fn run(&self) -> Result<RunReport, RunnerError> {
        let client =
            ReqwestClient::new(self.timeout).map_err(|e| RunnerError::Http(e.to_string()))?;
        self.run_with(&client)
    }

    /// Execute all selected cases through `client`.
    ///
    /// # Errors
    ///
    /// Returns error if the spec cannot be read, parsed, or synthesized.
    pub fn run_with<C: HttpClient>(&self, client: &C) -> Result<RunReport, RunnerError> {
        let cases = self.load_cases()?;
        let executor = Executor::new(client, &self.base_url, &self.headers);

        tracing::info!(
            cases = cases.len(),
            jobs = self.jobs,
            base_url = %self.base_url,
            "running contract tests"
        );

        let start = Instant::now();
        let outcomes = if self.jobs > 1 && cases.len() > 1 {
            self.execute_parallel(&executor, &cases)
        } else {
            self.execute_sequential(&executor, &cases)
        };
        let duration = start.elapsed().as_secs_f64();

        let report = RunReport::new(
            self.base_url.clone(),
            self.spec_path.display().to_string(),
            outcomes,
            duration,
        );
        tracing::info!(
            passed = report.stats.passed,
            failed = report.stats.failed,
            transport_errors = report.stats.transport_errors,
            "run finished"
        );
        Ok(report)
    }

    fn execute_sequential<C: HttpClient>(
        &self,
        executor: &Executor<'_, C>,
        cases: &[TestCase],
    ) -> Vec<CaseOutcome> {
        let mut outcomes = Vec::with_capacity(cases.len());
        for case in cases {
            let outcome = executor.execute(case);
            let failed = !outcome.passed();
            outcomes.push(outcome);
            if failed && self.stop_on_failure {
                tracing::info!(case = case.id, "stopped early: failure detected");
                break;
            }
        }
        outcomes
    }

    /// Workers pull the next case index from a shared counter; outcomes are
    /// re-sorted into synthesis order afterwards.
    fn execute_parallel<C: HttpClient>(
        &self,
        executor: &Executor<'_, C>,
        cases: &[TestCase],
    ) -> Vec<CaseOutcome> {
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let stop_on_failure = self.stop_on_failure;
        let (tx, rx) = mpsc::channel::<CaseOutcome>();

        std::thread::scope(|scope| {
            for _ in 0..self.jobs.min(cases.len()) {
                let tx = tx.clone();
                let (next, stop) = (&next, &stop);
                scope.spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(case) = cases.get(idx) else {
                            break;
                        };
                        let outcome = executor.execute(case);
                        if stop_on_failure && !outcome.passed() {
                            stop.store(true, Ordering::Relaxed);
                        }
                        if tx.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        if stop.load(Ordering::Relaxed) {
            tracing::info!("stopped early: failure detected");
        }

        let mut outcomes: Vec<CaseOutcome> = rx.into_iter().collect();
        outcomes.sort_by_key(|o| o.case_id);
        outcomes
    }
}
