//! The Unit Resolver port: assigns every method to a scheduling shard
//! before analysis starts.

use crate::shared::models::UnitId;
use std::fmt::Debug;
use std::hash::Hash;

/// Deterministic assignment of methods to units. Must agree with itself
/// across calls and across Runners: a pure function of the method,
/// consulted identically by every Runner and by the Manager.
pub trait UnitResolver<M: Clone + Eq + Hash + Debug + Send + Sync>: Send + Sync {
    fn resolve(&self, method: &M) -> UnitId;
}
