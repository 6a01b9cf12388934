//! Orchestration error types.

use dataflow_ir::models::UnitId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors the Manager can raise. Only configuration failures and
/// cancellation are user-visible; everything else (flow
/// function failures, application-graph inconsistencies, cross-unit
/// protocol violations) is logged and contained to the offending edge or
/// method, never surfaced here.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("analysis configuration error: {0}")]
    Config(#[from] dataflow_ir::config::ConfigError),

    #[error("unit task for {0:?} panicked or was aborted: {1}")]
    UnitTaskFailed(UnitId, String),

    #[error("no inbox registered for unit {0:?}; the Manager never spawned a Runner for it")]
    UnknownUnit(UnitId),

    #[error("run was cancelled before reaching quiescence")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
