//! Analysis-specific sink classification.
//!
//! The engine itself carries no notion of "taint" or "null pointer": only
//! the flow-function contract and sink/source declarations live here,
//! concrete analyses are external. A `SinkOracle` is the minimal
//! hook the Runner needs to decide whether a freshly produced vertex
//! should be reported.

use super::application_graph::ApplicationGraph;
use crate::shared::models::{DataflowFact, Vertex};

/// A sink classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkHit {
    pub message: String,
    pub rule: Option<String>,
}

impl SinkHit {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rule: None,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

/// Asked once per newly discovered vertex: after each new edge, the
/// Runner asks the analysis-specific handler whether its `to` vertex is a
/// sink.
pub trait SinkOracle<G: ApplicationGraph, F: DataflowFact>: Send + Sync {
    fn classify(&self, vertex: &Vertex<G::Statement, F>) -> Option<SinkHit>;
}
