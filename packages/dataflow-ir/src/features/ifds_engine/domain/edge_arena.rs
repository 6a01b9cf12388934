//! Per-unit edge storage and the predecessor index built over it.
//!
//! Every edge a Runner ever discovers is interned here exactly once; the
//! index it gets back (`EdgeId`) is what every `Reason` in the
//! predecessor index points at. Interning is the single idempotency
//! checkpoint of the whole solver: if the edge is already known, the
//! reason is appended and nothing else happens, which is exactly what
//! `intern` returning `is_new = false` gives the caller.

use crate::shared::models::{DataflowFact, Edge, EdgeId, Reason, UnitId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

/// Owns every path edge discovered by one Runner, plus the reasons each
/// was added for.
#[derive(Debug)]
pub struct EdgeArena<Stmt, F: DataflowFact> {
    unit: UnitId,
    edges: Vec<Edge<Stmt, F>>,
    index_of: FxHashMap<Edge<Stmt, F>, usize>,
    predecessors: FxHashMap<usize, FxHashSet<Reason>>,
}

impl<Stmt: Clone + Eq + Hash, F: DataflowFact> EdgeArena<Stmt, F> {
    pub fn new(unit: UnitId) -> Self {
        Self {
            unit,
            edges: Vec::new(),
            index_of: FxHashMap::default(),
            predecessors: FxHashMap::default(),
        }
    }

    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    /// Interns `edge`, returning its `EdgeId` and whether this is the
    /// first time the arena has seen it.
    pub fn intern(&mut self, edge: Edge<Stmt, F>) -> (EdgeId, bool) {
        if let Some(&index) = self.index_of.get(&edge) {
            return (EdgeId::new(self.unit.clone(), index), false);
        }
        let index = self.edges.len();
        self.index_of.insert(edge.clone(), index);
        self.edges.push(edge);
        self.predecessors.insert(index, FxHashSet::default());
        (EdgeId::new(self.unit.clone(), index), true)
    }

    /// Adds `reason` to the edge's predecessor set, returning `true` if it
    /// was not already recorded (a genuinely new derivation of an edge
    /// that was already known, e.g. two different callers reaching the
    /// same summary).
    pub fn add_reason(&mut self, id: &EdgeId, reason: Reason) -> bool {
        debug_assert_eq!(&id.unit, &self.unit);
        self.predecessors
            .entry(id.index)
            .or_default()
            .insert(reason)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge<Stmt, F>> {
        if id.unit != self.unit {
            return None;
        }
        self.edges.get(id.index)
    }

    pub fn reasons(&self, id: &EdgeId) -> Option<&FxHashSet<Reason>> {
        if id.unit != self.unit {
            return None;
        }
        self.predecessors.get(&id.index)
    }

    pub fn id_of(&self, edge: &Edge<Stmt, F>) -> Option<EdgeId> {
        self.index_of
            .get(edge)
            .map(|&index| EdgeId::new(self.unit.clone(), index))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, &Edge<Stmt, F>)> {
        self.edges
            .iter()
            .enumerate()
            .map(move |(index, edge)| (EdgeId::new(self.unit.clone(), index), edge))
    }
}

/// A read-only view across every unit's arena, used by the Trace-Graph
/// Builder to walk predecessor chains that cross unit boundaries:
/// cross-unit summary edges resolve through the subscribing unit's own
/// copy.
pub trait PredecessorSource<Stmt, F: DataflowFact> {
    fn edge(&self, id: &EdgeId) -> Option<&Edge<Stmt, F>>;
    fn reasons(&self, id: &EdgeId) -> Option<&FxHashSet<Reason>>;
}

impl<Stmt: Clone + Eq + Hash, F: DataflowFact> PredecessorSource<Stmt, F> for EdgeArena<Stmt, F> {
    fn edge(&self, id: &EdgeId) -> Option<&Edge<Stmt, F>> {
        EdgeArena::edge(self, id)
    }

    fn reasons(&self, id: &EdgeId) -> Option<&FxHashSet<Reason>> {
        EdgeArena::reasons(self, id)
    }
}

/// A merged view across every unit's arena, assembled once a run reaches
/// quiescence (or a live read-locked view, in the orchestration crate).
pub struct GlobalPredecessorIndex<Stmt, F: DataflowFact> {
    arenas: FxHashMap<UnitId, EdgeArena<Stmt, F>>,
}

impl<Stmt: Clone + Eq + Hash, F: DataflowFact> GlobalPredecessorIndex<Stmt, F> {
    pub fn new() -> Self {
        Self {
            arenas: FxHashMap::default(),
        }
    }

    pub fn insert_arena(&mut self, arena: EdgeArena<Stmt, F>) {
        self.arenas.insert(arena.unit().clone(), arena);
    }
}

impl<Stmt: Clone + Eq + Hash, F: DataflowFact> Default for GlobalPredecessorIndex<Stmt, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Stmt: Clone + Eq + Hash, F: DataflowFact> PredecessorSource<Stmt, F>
    for GlobalPredecessorIndex<Stmt, F>
{
    fn edge(&self, id: &EdgeId) -> Option<&Edge<Stmt, F>> {
        self.arenas.get(&id.unit).and_then(|arena| arena.edge(id))
    }

    fn reasons(&self, id: &EdgeId) -> Option<&FxHashSet<Reason>> {
        self.arenas
            .get(&id.unit)
            .and_then(|arena| arena.reasons(id))
    }
}
