//! Aggregated run output and the external JSON result schema: a list of
//! `Vulnerability { type, source-list, sink, trace-list }`.

use dataflow_ir::ifds_engine::TraceGraph;
use dataflow_ir::models::{DataflowFact, EdgeId, TraceRecord, UnitId, Vertex, Vulnerability, VulnerabilityReport};
use std::io::Write;
use uuid::Uuid;

/// Converts a `Statement` into the `(method, line, statement-text)` triple
/// the result schema wants. The engine itself never inspects statement
/// structure, so this hook lives at the orchestration boundary, next to
/// the rest of the result-serialization concerns.
pub trait StatementLocator<Stmt>: Send + Sync {
    fn locate(&self, statement: &Stmt) -> TraceRecord;
}

/// One sink hit as produced by a Runner, tagged with the unit that found
/// it so traces can be reconstructed against the right arena.
#[derive(Debug, Clone)]
pub struct Hit<Stmt, F: DataflowFact> {
    pub unit: UnitId,
    pub sink_edge: EdgeId,
    pub vulnerability: Vulnerability<Stmt, F>,
}

/// Everything a `Manager::run` produced, without yet being projected into
/// the external result schema. Kept in engine types so tests can assert
/// on them directly instead of round-tripping through JSON.
#[derive(Debug, Clone)]
pub struct AggregatedReport<Stmt, F: DataflowFact> {
    /// Identifies this run in logs and in `RunHistory`, one fresh `Uuid`
    /// per `Manager::run` call.
    pub run_id: Uuid,
    pub hits: Vec<Hit<Stmt, F>>,
    /// Per-method summary counts, purely informational: summary
    /// uniqueness is a Runner-local invariant, so this is a cross-unit
    /// rollup for observability, not correctness.
    pub summary_counts: std::collections::HashMap<String, usize>,
    /// Set when the run was cancelled before quiescence. Each Runner
    /// releases its worklist promptly and the Manager surfaces a partial
    /// result rather than blocking forever.
    pub partial: bool,
}

impl<Stmt, F: DataflowFact> AggregatedReport<Stmt, F> {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            hits: Vec::new(),
            summary_counts: std::collections::HashMap::new(),
            partial: false,
        }
    }

    /// A `RunSummary` suitable for `RunHistory::record`, independent of
    /// this report's `Statement`/`Fact` types.
    pub fn summary(&self) -> crate::history::RunSummary {
        crate::history::RunSummary {
            run_id: self.run_id,
            vulnerability_count: self.hits.len(),
            partial: self.partial,
        }
    }

    /// Projects one hit's trace graph into the external wire schema,
    /// using `locator` to stringify statements and `max_traces` to bound
    /// the number of enumerated witnesses.
    pub fn to_vulnerability_report(
        &self,
        trace: &TraceGraph<Stmt, F>,
        vulnerability_type: impl Into<String>,
        locator: &dyn StatementLocator<Stmt>,
        sink: &Vertex<Stmt, F>,
    ) -> VulnerabilityReport {
        let sink_record = locator.locate(&sink.statement);
        let mut sources = Vec::new();
        let mut traces = Vec::new();
        for path in &trace.traces {
            let records: Vec<TraceRecord> = path.iter().map(|v| locator.locate(&v.statement)).collect();
            if let Some(first) = path.first() {
                if first.is_zero() {
                    let record = locator.locate(&first.statement);
                    if !sources.iter().any(|r: &TraceRecord| r == &record) {
                        sources.push(record);
                    }
                }
            }
            traces.push(records);
        }
        VulnerabilityReport {
            vulnerability_type: vulnerability_type.into(),
            sources,
            sink: sink_record,
            traces,
        }
    }
}

/// Writes `reports` as a pretty-printed JSON array to `writer`, the wire
/// format named in the result schema (`vulnerabilityType`, `sources`,
/// `sink`, `traces`).
pub fn write_vulnerability_reports(
    writer: &mut impl Write,
    reports: &[VulnerabilityReport],
) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, reports)
}

/// Serializes `reports` to a JSON string, for callers that want the text
/// directly rather than writing to an `io::Write`.
pub fn vulnerability_reports_to_json(reports: &[VulnerabilityReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}
