//! Pending cross-unit call expansion.

use super::edge::Edge;
use super::fact::DataflowFact;
use super::unit::UnitId;
use super::vertex::Vertex;
use std::hash::Hash;

/// A standing request from one Runner to be notified of future summaries
/// at a callee-entry vertex owned by another Runner.
///
/// `caller_edge` is carried by value (not by `EdgeId`) because the caller
/// edge lives in the *subscriber's* edge arena, which the target Runner has
/// no access to; the subscriber is the only one that needs to resolve it
/// back into its own arena once a matching summary arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription<Stmt, F: DataflowFact> {
    pub subscriber: UnitId,
    pub target: UnitId,
    pub caller_edge: Edge<Stmt, F>,
    pub callee_entry: Vertex<Stmt, F>,
}

impl<Stmt: Clone + Eq + Hash, F: DataflowFact> Subscription<Stmt, F> {
    pub fn new(
        subscriber: UnitId,
        target: UnitId,
        caller_edge: Edge<Stmt, F>,
        callee_entry: Vertex<Stmt, F>,
    ) -> Self {
        Self {
            subscriber,
            target,
            caller_edge,
            callee_entry,
        }
    }

    /// Does a published summary satisfy this subscription?
    ///
    /// A summary satisfies the subscription when its `from` vertex equals
    /// the subscribed callee-entry vertex, i.e. it was produced by
    /// exactly the entry fact this subscription is waiting on.
    pub fn matches(&self, summary_from: &Vertex<Stmt, F>) -> bool {
        summary_from == &self.callee_entry
    }
}
