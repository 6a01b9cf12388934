//! Why an edge was added.
//!
//! Every non-`Initial` reason references previously existing edges by
//! `EdgeId`, never by owning reference, so the predecessor graph can be
//! cyclic (recursion, loops) without a cyclic ownership structure.

use super::edge::EdgeId;

/// Tagged union of the ways a path edge can be derived.
///
/// A single edge carries one *primary* reason (the first reason it was
/// added for); every reason it is rediscovered under afterward is recorded
/// in the Runner's `predecessors` index as an additional `Reason` value.
/// The set of reasons for an edge only grows over the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reason {
    /// Seed edge produced by `FlowFunctions::initial`.
    Initial,

    /// Intra-procedural step from a non-call, non-exit statement.
    Sequent(EdgeId),

    /// Call-to-return step: the effect of a call without descending into
    /// callees.
    CallToReturn(EdgeId),

    /// Opening an interprocedural edge into a callee's entry.
    CallToStart(EdgeId),

    /// A published summary replayed against a caller edge at the return
    /// site, within the *same* unit.
    ExitToReturnSite { caller: EdgeId, summary: EdgeId },

    /// A summary edge (possibly published by another unit) applied to
    /// continue a caller's path at its return site.
    ThroughSummary { pred: EdgeId, summary: EdgeId },

    /// A call resolved to a callee owned by a different unit; the edge
    /// exists pending that unit's summary via a `Subscription`.
    CrossUnitCall(EdgeId),

    /// Produced by an external collaborator (e.g. a flow function that
    /// consulted state outside the edge's own derivation chain). Treated
    /// as a source by the Trace-Graph Builder, like `Initial`.
    External,
}

impl Reason {
    /// The edges this reason directly references, for predecessor-graph
    /// traversal.
    pub fn referenced_edges(&self) -> Vec<EdgeId> {
        match self {
            Reason::Initial | Reason::External => Vec::new(),
            Reason::Sequent(e)
            | Reason::CallToReturn(e)
            | Reason::CallToStart(e)
            | Reason::CrossUnitCall(e) => vec![e.clone()],
            Reason::ExitToReturnSite { caller, summary } => vec![caller.clone(), summary.clone()],
            Reason::ThroughSummary { pred, summary } => vec![pred.clone(), summary.clone()],
        }
    }
}
