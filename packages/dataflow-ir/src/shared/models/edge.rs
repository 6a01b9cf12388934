//! Path edges: `(from, to)` pairs from a procedure-entry vertex to an
//! intra-procedural vertex.

use super::fact::DataflowFact;
use super::vertex::Vertex;
use std::hash::Hash;

/// An index into one unit's edge arena, qualified by the owning unit.
///
/// Predecessor records reference edges by index, never by owning
/// reference. This is what lets the predecessor graph be cyclic without
/// fighting the borrow checker. The `unit` tag is what lets a `Reason`
/// recorded by one Runner point at a summary edge that lives in a
/// *different* Runner's arena (cross-unit calls), without the two Runners
/// sharing an index space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeId {
    pub unit: super::unit::UnitId,
    pub index: usize,
}

impl EdgeId {
    pub fn new(unit: super::unit::UnitId, index: usize) -> Self {
        Self { unit, index }
    }
}

/// A path edge: `from` is an entry vertex of `method(to.statement)`, `to`
/// is some (possibly the same) vertex reachable from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge<Stmt, F: DataflowFact> {
    pub from: Vertex<Stmt, F>,
    pub to: Vertex<Stmt, F>,
}

impl<Stmt: Clone + Eq + Hash, F: DataflowFact> Edge<Stmt, F> {
    pub fn new(from: Vertex<Stmt, F>, to: Vertex<Stmt, F>) -> Self {
        Self { from, to }
    }
}

/// A path edge whose `to` vertex sits at an exit point of its method,
/// i.e. a summary of the method's effect for one entry fact.
///
/// Immutable once published: a Runner never mutates or retracts a
/// summary after broadcasting it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryEdge<Stmt, F: DataflowFact>(pub Edge<Stmt, F>);

impl<Stmt: Clone + Eq + Hash, F: DataflowFact> SummaryEdge<Stmt, F> {
    pub fn new(edge: Edge<Stmt, F>) -> Self {
        Self(edge)
    }

    pub fn edge(&self) -> &Edge<Stmt, F> {
        &self.0
    }
}
