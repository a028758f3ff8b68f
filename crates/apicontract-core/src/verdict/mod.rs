//! Verdict module - per-case outcomes and the overall judgement

mod outcome;
mod policy;

pub use outcome::{CaseOutcome, Failure, RequestSnapshot, ResponseSnapshot};
pub use policy::{
    EXIT_ASSERTION, EXIT_PASS, EXIT_TOOL, EXIT_TRANSPORT, Verdict, VerdictStatus,
};
