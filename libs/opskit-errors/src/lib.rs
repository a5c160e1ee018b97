//! Outward error representation shared by every back-office crate.
//!
//! Each layer keeps its own `thiserror` enum and converts into [`Problem`]
//! at the boundary; the HTTP layer (not part of this workspace) only ever
//! sees `Problem`.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod problem;

pub use catalog::ErrDef;
pub use problem::{APPLICATION_PROBLEM_JSON, Problem, ValidationViolation};

/// Attach the request path and trace id to a problem before it leaves the service.
pub fn finalize(p: Problem, instance: &str, trace_id: Option<String>) -> Problem {
    let p = p.with_instance(instance);
    match trace_id {
        Some(tid) => p.with_trace_id(tid),
        None => p,
    }
}
