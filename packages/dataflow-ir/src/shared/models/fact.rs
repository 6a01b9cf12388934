//! Dataflow fact trait.
//!
//! A `Fact` is an opaque element of the analysis's abstract domain. The
//! engine never inspects a fact's structure: it only needs equality,
//! hashing, and a distinguished `Zero` element meaning "reachable with no
//! dataflow assumption", the trace-root marker used by witness
//! reconstruction.

use std::fmt::Debug;
use std::hash::Hash;

/// An element of a user-defined dataflow domain.
///
/// Implementors are plain value types (e.g. `enum TaintFact { Zero,
/// Tainted(VarId) }`). The engine stores facts in hash sets and clones them
/// freely, so keep them cheap to clone.
pub trait DataflowFact: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// The distinguished ZERO fact: unconditional reachability, independent
    /// of any concrete dataflow value.
    fn zero() -> Self;

    /// True iff `self` is the ZERO fact.
    fn is_zero(&self) -> bool;
}
