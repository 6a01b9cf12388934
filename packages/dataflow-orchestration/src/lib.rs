//! dataflow-orchestration: the async Manager that drives `dataflow-ir`'s
//! per-unit Runners to global quiescence.
//!
//! Everything that needs a scheduler lives here; `dataflow-ir` itself stays
//! synchronous and runtime-agnostic. This crate owns:
//! - `manager`   : the cross-unit coordinator and its task-per-unit model.
//! - `report`    : the aggregated run output and the external JSON schema.
//! - `history`   : an in-memory record of recent runs, for callers that
//!                 want to inspect past results without re-running.
//! - `error`     : orchestration-level error types.

pub mod error;
pub mod history;
pub mod manager;
pub mod report;

pub use error::{OrchestratorError, Result};
pub use history::{RunHistory, RunSummary};
pub use manager::Manager;
pub use report::{
    vulnerability_reports_to_json, write_vulnerability_reports, AggregatedReport, Hit, StatementLocator,
};

/// Installs a `tracing-subscriber` `fmt` layer honoring `RUST_LOG`.
///
/// Not called automatically by anything in this crate. Library consumers
/// own their own logging setup; this is offered as a convenience for
/// binaries embedding the Manager directly, using the standard
/// env-filtered `tracing-subscriber` init pattern.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_does_not_panic_when_called_twice() {
        super::init_tracing();
        super::init_tracing();
    }
}
