//! apicontract-core: contract test synthesis from API specification examples
//!
//! This crate compiles a specification document's per-status response
//! examples into self-contained test cases, and reconciles live response
//! bodies against the declared (possibly placeholder-typed) examples.
//! It performs no network I/O.

pub mod config;
pub mod endpoint;
pub mod fixture;
pub mod generator;
pub mod plan;
pub mod reconcile;
pub mod report;
pub mod spec;
pub mod synth;
pub mod verdict;

pub use config::{Config, ConfigError};
pub use endpoint::{EndpointError, append_query, build_endpoint};
pub use fixture::{Fixture, HttpMethod, RequestFixture, ResponseFixture, TestCase};
pub use generator::to_http_file;
pub use plan::Plan;
pub use reconcile::{Placeholder, ReconcileError, json_eq, project, reconcile};
pub use report::{ReportError, RunReport, RunStats};
pub use spec::Specification;
pub use synth::{SynthesisError, synthesize};
pub use verdict::{CaseOutcome, Failure, Verdict, VerdictStatus};
