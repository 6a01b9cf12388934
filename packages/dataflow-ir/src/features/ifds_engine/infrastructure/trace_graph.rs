//! The Trace-Graph Builder: reconstructs source-to-sink witness traces
//! from the predecessor index built while solving.
//!
//! The predecessor graph can be cyclic (recursive methods, loops), so the
//! walk is a cycle-safe reverse-DFS: any `EdgeId` already on the current
//! DFS stack terminates that branch instead of recursing into it.
//! Crossing a summary boundary (`ExitToReturnSite` / `ThroughSummary`)
//! splits the walk into two segments: the caller side keeps tracing back
//! through the call site as normal, while the summary side enters "stop
//! at method start" mode, so that segment shows one hop into the callee
//! and no further. Every combination of a caller segment and a summary
//! segment is spliced into its own witness: caller-side vertices, then
//! the callee's entry and exit, then the point where the summary was
//! applied. Stop-at-method-start mode persists for the whole summary
//! segment, not just the first hop into it, so the walk cannot wander
//! back out of the callee through its own `CallToStart` self-edge.

use super::super::domain::PredecessorSource;
use crate::shared::models::{DataflowFact, EdgeId, Reason, Vertex};
use std::collections::HashSet;
use std::hash::Hash;

/// One reconstructed witness: an ordered sequence of vertices from a
/// source (or otherwise root) vertex to the sink.
pub type Trace<Stmt, F> = Vec<Vertex<Stmt, F>>;

/// The traces recovered for one vulnerability.
#[derive(Debug, Clone)]
pub struct TraceGraph<Stmt, F: DataflowFact> {
    pub sink: Vertex<Stmt, F>,
    pub traces: Vec<Trace<Stmt, F>>,
    /// Set when the walk stopped early because `max_traces` was reached.
    /// The traces returned are a sample, not the complete set.
    pub truncated: bool,
}

/// Reconstructs `TraceGraph`s from a `PredecessorSource` (a single
/// Runner's own arena, or a `GlobalPredecessorIndex` merged across
/// units).
pub struct TraceGraphBuilder<'a, Stmt, F, P> {
    index: &'a P,
    max_traces: usize,
    max_path_length: Option<usize>,
    _marker: std::marker::PhantomData<(Stmt, F)>,
}

impl<'a, Stmt, F, P> TraceGraphBuilder<'a, Stmt, F, P>
where
    Stmt: Clone + Eq + Hash,
    F: DataflowFact,
    P: PredecessorSource<Stmt, F>,
{
    pub fn new(index: &'a P, max_traces: usize, max_path_length: Option<usize>) -> Self {
        Self {
            index,
            max_traces,
            max_path_length,
            _marker: std::marker::PhantomData,
        }
    }

    /// Builds the trace graph for the vertex reached by `sink_edge`.
    ///
    /// Panics if `sink_edge` does not resolve in the index. Callers only
    /// ever pass ids they themselves received in a `NewVulnerability`
    /// message, so this indicates a caller bug, not a data condition.
    pub fn build(&self, sink_edge: &EdgeId) -> TraceGraph<Stmt, F> {
        let sink = self
            .index
            .edge(sink_edge)
            .map(|e| e.to.clone())
            .expect("sink edge must resolve in the predecessor index");

        let mut on_stack = HashSet::new();
        let mut truncated = false;
        let traces = self.walk(sink_edge, false, &mut on_stack, &mut truncated);

        TraceGraph {
            sink,
            traces,
            truncated,
        }
    }

    fn walk(
        &self,
        id: &EdgeId,
        entered_via_summary: bool,
        on_stack: &mut HashSet<EdgeId>,
        truncated: &mut bool,
    ) -> Vec<Trace<Stmt, F>> {
        if self.max_traces == 0 {
            return Vec::new();
        }
        if on_stack.contains(id) {
            // Cycle: this branch cannot supply a finite witness; drop it
            // rather than looping forever.
            return Vec::new();
        }
        let (Some(edge), Some(reasons)) = (self.index.edge(id), self.index.reasons(id)) else {
            return Vec::new();
        };
        let here = edge.to.clone();

        let mut traces: Vec<Trace<Stmt, F>> = Vec::new();

        // A vertex that is itself a source, or that is the method-start
        // boundary we refuse to cross while inside a summary, terminates
        // the walk here regardless of how many reasons it also carries.
        let is_source_root = here.is_zero()
            || reasons
                .iter()
                .any(|r| matches!(r, Reason::Initial | Reason::External));
        let is_summary_boundary =
            entered_via_summary && reasons.iter().any(|r| matches!(r, Reason::CallToStart(_)));
        if is_source_root || is_summary_boundary {
            traces.push(vec![here.clone()]);
        }

        on_stack.insert(id.clone());
        'reasons: for reason in reasons.iter() {
            if entered_via_summary && matches!(reason, Reason::CallToStart(_)) {
                // Already recorded as a summary boundary above; don't
                // recurse back out through the caller that opened it.
                continue;
            }

            let refs = reason.referenced_edges();
            let reached_cap = match refs.as_slice() {
                [pred] => self.extend(pred, entered_via_summary, &here, &mut traces, on_stack, truncated),
                [caller, summary] => self.splice(
                    caller,
                    summary,
                    entered_via_summary,
                    &here,
                    &mut traces,
                    on_stack,
                    truncated,
                ),
                _ => false,
            };
            if reached_cap {
                break 'reasons;
            }
        }
        on_stack.remove(id);

        traces
    }

    /// Extends every predecessor trace of an ordinary (single-reference)
    /// reason with `here`. `entered_via_summary` is passed through
    /// unchanged, since an ordinary step never opens or closes a summary
    /// segment.
    fn extend(
        &self,
        pred: &EdgeId,
        entered_via_summary: bool,
        here: &Vertex<Stmt, F>,
        traces: &mut Vec<Trace<Stmt, F>>,
        on_stack: &mut HashSet<EdgeId>,
        truncated: &mut bool,
    ) -> bool {
        for trace in self.walk(pred, entered_via_summary, on_stack, truncated) {
            if self.record(trace, here, traces, truncated) {
                return true;
            }
        }
        false
    }

    /// Splices the caller-side segment (reached through `caller`, in the
    /// current scope) with the summary-internal segment (reached through
    /// `summary`, always walked in stop-at-method-start mode) into one
    /// combined witness per pairing, then appends `here`.
    fn splice(
        &self,
        caller: &EdgeId,
        summary: &EdgeId,
        entered_via_summary: bool,
        here: &Vertex<Stmt, F>,
        traces: &mut Vec<Trace<Stmt, F>>,
        on_stack: &mut HashSet<EdgeId>,
        truncated: &mut bool,
    ) -> bool {
        let caller_traces = self.walk(caller, entered_via_summary, on_stack, truncated);
        let summary_traces = self.walk(summary, true, on_stack, truncated);
        for caller_trace in &caller_traces {
            for summary_trace in &summary_traces {
                let mut combined = caller_trace.clone();
                combined.extend(summary_trace.iter().cloned());
                if self.record(combined, here, traces, truncated) {
                    return true;
                }
            }
        }
        false
    }

    /// Appends `here` to `trace_body` and records it, respecting
    /// `max_path_length` and `max_traces`. Returns true once the cap is
    /// reached, signalling the caller to stop exploring further reasons.
    fn record(
        &self,
        mut trace_body: Trace<Stmt, F>,
        here: &Vertex<Stmt, F>,
        traces: &mut Vec<Trace<Stmt, F>>,
        truncated: &mut bool,
    ) -> bool {
        if let Some(limit) = self.max_path_length {
            if trace_body.len() >= limit {
                return false;
            }
        }
        trace_body.push(here.clone());
        traces.push(trace_body);
        if traces.len() >= self.max_traces {
            *truncated = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ifds_engine::domain::EdgeArena;
    use crate::shared::models::{Edge, UnitId};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Fact(u32);

    impl DataflowFact for Fact {
        fn zero() -> Self {
            Fact(0)
        }
        fn is_zero(&self) -> bool {
            self.0 == 0
        }
    }

    fn v(label: &'static str, fact: u32) -> Vertex<&'static str, Fact> {
        Vertex::new(label, Fact(fact))
    }

    #[test]
    fn reconstructs_a_straight_line_trace() {
        let mut arena: EdgeArena<&str, Fact> = EdgeArena::new(UnitId::Singleton);
        let (e0, _) = arena.intern(Edge::new(v("entry", 0), v("entry", 0)));
        arena.add_reason(&e0, Reason::Initial);
        let (e1, _) = arena.intern(Edge::new(v("entry", 0), v("source", 1)));
        arena.add_reason(&e1, Reason::Sequent(e0.clone()));
        let (e2, _) = arena.intern(Edge::new(v("entry", 0), v("sink", 1)));
        arena.add_reason(&e2, Reason::Sequent(e1.clone()));

        let builder = TraceGraphBuilder::new(&arena, 10, None);
        let graph = builder.build(&e2);

        assert_eq!(graph.traces.len(), 1);
        assert_eq!(
            graph.traces[0],
            vec![v("entry", 0), v("source", 1), v("sink", 1)]
        );
        assert!(!graph.truncated);
    }

    #[test]
    fn cycles_do_not_loop_forever() {
        let mut arena: EdgeArena<&str, Fact> = EdgeArena::new(UnitId::Singleton);
        let (e0, _) = arena.intern(Edge::new(v("entry", 0), v("entry", 0)));
        arena.add_reason(&e0, Reason::Initial);
        let (e1, _) = arena.intern(Edge::new(v("entry", 0), v("loop", 1)));
        arena.add_reason(&e1, Reason::Sequent(e0.clone()));
        // e1 also claims to be reachable from itself (a recursive loop);
        // the cycle guard must still terminate the walk.
        arena.add_reason(&e1.clone(), Reason::Sequent(e1.clone()));

        let builder = TraceGraphBuilder::new(&arena, 10, None);
        let graph = builder.build(&e1);
        assert_eq!(graph.traces.len(), 1);
    }

    #[test]
    fn max_traces_truncates_and_flags_result() {
        let mut arena: EdgeArena<&str, Fact> = EdgeArena::new(UnitId::Singleton);
        let (e0, _) = arena.intern(Edge::new(v("entry", 0), v("entry", 0)));
        arena.add_reason(&e0, Reason::Initial);
        let (e1, _) = arena.intern(Edge::new(v("entry", 0), v("a", 1)));
        arena.add_reason(&e1, Reason::Sequent(e0.clone()));
        let (e2, _) = arena.intern(Edge::new(v("entry", 0), v("b", 1)));
        arena.add_reason(&e2, Reason::Sequent(e0.clone()));
        let (sink, _) = arena.intern(Edge::new(v("entry", 0), v("sink", 1)));
        arena.add_reason(&sink, Reason::Sequent(e1));
        arena.add_reason(&sink, Reason::Sequent(e2));

        let builder = TraceGraphBuilder::new(&arena, 1, None);
        let graph = builder.build(&sink);
        assert_eq!(graph.traces.len(), 1);
        assert!(graph.truncated);
    }
}
