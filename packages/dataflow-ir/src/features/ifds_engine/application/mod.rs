//! A synchronous, single-unit driver for the engine.
//!
//! `InProcessEngine` plays the Manager's role (resolving calls, routing
//! subscriptions) for the degenerate case where every method maps to the
//! same unit. Useful directly for small inputs, and as the reference
//! implementation the async Manager in `dataflow-orchestration` is
//! expected to agree with: a single-unit run and an N-unit run over the
//! same program must produce the same vulnerabilities.

use super::domain::GlobalPredecessorIndex;
use super::infrastructure::{IncomingMessage, OutgoingMessage, Runner, TraceGraph, TraceGraphBuilder};
use super::ports::UnitResolver;
use crate::shared::models::{DataflowFact, EdgeId, UnitId, Vulnerability};
use crate::shared::ports::{ApplicationGraph, FlowFunctions, SinkOracle};
use std::sync::Arc;

/// Output of an `InProcessEngine` run.
#[derive(Debug, Clone)]
pub struct AnalysisReport<Stmt, F: DataflowFact> {
    pub hits: Vec<(EdgeId, Vulnerability<Stmt, F>)>,
}

pub struct InProcessEngine<G, F, FF, S>
where
    G: ApplicationGraph,
    F: DataflowFact,
{
    graph: Arc<G>,
    resolver: Arc<dyn UnitResolver<G::Method>>,
    runner: Runner<G, F, FF, S>,
}

impl<G, F, FF, S> InProcessEngine<G, F, FF, S>
where
    G: ApplicationGraph,
    F: DataflowFact,
    FF: FlowFunctions<G, F>,
    S: SinkOracle<G, F>,
{
    /// `unit` is the single unit every method passed to `analyze` is
    /// expected to resolve to under `resolver`. Callers driving more
    /// than one unit need the async Manager in `dataflow-orchestration`
    /// instead, not this engine.
    pub fn new(
        graph: Arc<G>,
        flow: Arc<FF>,
        sinks: Arc<S>,
        unit: UnitId,
        resolver: Arc<dyn UnitResolver<G::Method>>,
    ) -> Self {
        let runner = Runner::new(graph.clone(), flow, sinks, unit, resolver.clone());
        Self {
            graph,
            resolver,
            runner,
        }
    }

    /// Runs every method in `methods` to quiescence, resolving calls
    /// in-process (every callee is assumed to land in the same unit as
    /// the single Runner this engine drives).
    pub fn analyze(&mut self, methods: &[G::Method]) -> AnalysisReport<G::Statement, F> {
        let mut pending = self.runner.seed(methods);
        pending.extend(self.runner.drain());

        let mut hits = Vec::new();
        loop {
            let mut next = Vec::new();
            for msg in pending {
                match msg {
                    OutgoingMessage::NewVulnerability {
                        sink_edge,
                        vulnerability,
                    } => hits.push((sink_edge, vulnerability)),
                    OutgoingMessage::NewSummaryEdge { .. } => {}
                    OutgoingMessage::SubscriptionOnStart(sub) => {
                        assert_eq!(
                            &sub.target,
                            self.runner.unit(),
                            "InProcessEngine assumes a single unit; got a subscription for a \
                             different one, use the orchestration crate's Manager instead"
                        );
                        next.extend(self.runner.handle_incoming(IncomingMessage::SubscriptionOnStart(sub)));
                    }
                    OutgoingMessage::UnresolvedCall { caller_edge } => {
                        let call_stmt = caller_edge.to.statement.clone();
                        for callee in self.graph.callees(&call_stmt) {
                            let callee_unit = self.resolver.resolve(&callee);
                            next.extend(self.runner.handle_incoming(IncomingMessage::ResolvedCall {
                                caller_edge: caller_edge.clone(),
                                callee,
                                callee_unit,
                            }));
                        }
                    }
                }
            }
            next.extend(self.runner.drain());
            if next.is_empty() {
                break;
            }
            pending = next;
        }

        AnalysisReport { hits }
    }

    /// Reconstructs witness traces for one previously reported hit.
    pub fn trace(&self, sink_edge: &EdgeId, max_traces: usize, max_path_length: Option<usize>) -> TraceGraph<G::Statement, F> {
        let builder = TraceGraphBuilder::new(self.runner.arena(), max_traces, max_path_length);
        builder.build(sink_edge)
    }

    pub fn runner(&self) -> &Runner<G, F, FF, S> {
        &self.runner
    }
}

/// Builds a merged predecessor index across every unit's arena once a
/// multi-unit run has quiesced. The cross-unit counterpart to
/// `InProcessEngine::trace`, used by the Manager after aggregating all
/// Runners' final state.
pub fn merge_arenas<Stmt, F>(
    arenas: impl IntoIterator<Item = super::domain::EdgeArena<Stmt, F>>,
) -> GlobalPredecessorIndex<Stmt, F>
where
    Stmt: Clone + Eq + std::hash::Hash,
    F: DataflowFact,
{
    let mut index = GlobalPredecessorIndex::new();
    for arena in arenas {
        index.insert_arena(arena);
    }
    index
}
