//! A small in-memory record of recently completed runs.
//!
//! Same shape as a `CheckpointManager`: an `Arc<parking_lot::Mutex<Vec<_>>>`
//! guarding an append-only log, queryable by run id. Unlike a checkpoint
//! manager this never persists to disk: `Manager::run` is a pure
//! in-memory computation, so there is nothing to resume from storage.
//! Callers who need durable history serialize `RunSummary` (it derives
//! `Serialize`) themselves.

use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// What a completed (or cancelled) run produced, independent of the
/// engine's `Statement`/`Fact` types. Enough to answer "how many runs have
/// I done, and how did they go" without holding on to the full,
/// analysis-specific `AggregatedReport`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub vulnerability_count: usize,
    pub partial: bool,
}

/// Thread-safe append-only log of `RunSummary`s, shared via `Arc` across
/// however many `Manager::run` calls a long-lived process makes.
#[derive(Debug, Default)]
pub struct RunHistory {
    runs: Arc<Mutex<Vec<RunSummary>>>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self {
            runs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Records one run's outcome. Idempotent per `run_id`: recording the
    /// same id twice replaces the earlier entry rather than duplicating it.
    pub fn record(&self, summary: RunSummary) {
        let mut runs = self.runs.lock();
        runs.retain(|r| r.run_id != summary.run_id);
        runs.push(summary);
    }

    pub fn get(&self, run_id: Uuid) -> Option<RunSummary> {
        self.runs.lock().iter().find(|r| r.run_id == run_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.lock().is_empty()
    }

    /// A snapshot of every run recorded so far, oldest first.
    pub fn all(&self) -> Vec<RunSummary> {
        self.runs.lock().clone()
    }
}

impl Clone for RunHistory {
    fn clone(&self) -> Self {
        Self {
            runs: Arc::clone(&self.runs),
        }
    }
}
