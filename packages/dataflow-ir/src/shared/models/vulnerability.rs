//! Sink hits and the witness traces that justify them.

use super::fact::DataflowFact;
use super::vertex::Vertex;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// A sink hit discovered by a Runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vulnerability<Stmt, F: DataflowFact> {
    pub sink: Vertex<Stmt, F>,
    pub message: String,
    pub rule: Option<String>,
}

impl<Stmt: Clone + Eq + Hash, F: DataflowFact> Vulnerability<Stmt, F> {
    pub fn new(sink: Vertex<Stmt, F>, message: impl Into<String>) -> Self {
        Self {
            sink,
            message: message.into(),
            rule: None,
        }
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }
}

/// One step of a reconstructed witness trace, ready for serialization into
/// the external result schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub method: String,
    pub line: u32,
    pub statement_text: String,
}

/// A fully serializable vulnerability report, produced once path edges
/// have been converted into the external JSON schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityReport {
    #[serde(rename = "vulnerabilityType")]
    pub vulnerability_type: String,
    pub sources: Vec<TraceRecord>,
    pub sink: TraceRecord,
    pub traces: Vec<Vec<TraceRecord>>,
}
