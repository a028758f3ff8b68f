//! apicontract-runner: contract test execution against a live service

pub mod client;
pub mod executor;
pub mod loader;
mod runner;

pub use client::{HttpClient, HttpRequest, HttpResponse, ReqwestClient, TransportError};
pub use executor::{Executor, check_response, decode_body};
pub use loader::load_spec;
pub use runner::ContractRunner;

use apicontract_core::SynthesisError;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("HTTP error: {0}")]
    Http(String),
}
