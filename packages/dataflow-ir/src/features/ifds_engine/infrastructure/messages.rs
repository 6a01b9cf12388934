//! The six message kinds Runners exchange, either directly (single-unit,
//! in-process tests) or through the Manager.

use crate::shared::models::{Edge, EdgeId, SummaryEdge, Subscription, UnitId, Vulnerability};
use crate::shared::ports::ApplicationGraph;

/// Emitted by a Runner, consumed by the Manager (or, in single-unit runs,
/// fed straight back into the same Runner).
#[derive(Debug, Clone)]
pub enum OutgoingMessage<G: ApplicationGraph, F> {
    /// A call site resolved to nothing locally known yet; the Manager
    /// must tell the Runner which unit(s) own the callee(s).
    UnresolvedCall {
        caller_edge: Edge<G::Statement, F>,
    },
    /// A standing request to be told about summaries published at a
    /// callee-entry vertex owned by another unit.
    SubscriptionOnStart(Subscription<G::Statement, F>),
    /// A new summary this Runner's unit just published, broadcast so the
    /// Manager can route it to standing subscribers and record it in the
    /// global summary store.
    NewSummaryEdge {
        method: G::Method,
        summary_id: EdgeId,
        summary: SummaryEdge<G::Statement, F>,
    },
    /// A sink hit, ready for trace reconstruction once the run quiesces.
    /// `sink_edge` is the id of the edge whose `to` vertex triggered the
    /// hit, so the Trace-Graph Builder can be handed it directly.
    NewVulnerability {
        sink_edge: EdgeId,
        vulnerability: Vulnerability<G::Statement, F>,
    },
}

/// Delivered to a Runner, either by the Manager or (in tests) directly.
#[derive(Debug, Clone)]
pub enum IncomingMessage<G: ApplicationGraph, F> {
    /// The Manager resolved a previously unresolved call to a concrete
    /// callee method and the unit that owns it.
    ResolvedCall {
        caller_edge: Edge<G::Statement, F>,
        callee: G::Method,
        callee_unit: UnitId,
    },
    /// Another unit is now waiting on summaries at `subscription`'s
    /// `callee_entry` vertex, which this Runner's unit owns.
    SubscriptionOnStart(Subscription<G::Statement, F>),
    /// A subscribed-to summary has been published; replay it against the
    /// subscribing caller edge.
    NotificationOnStart {
        caller_edge: Edge<G::Statement, F>,
        summary_id: EdgeId,
        summary: SummaryEdge<G::Statement, F>,
    },
}
