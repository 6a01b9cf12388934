//! Core solver data structures: the edge arena and predecessor index.

mod edge_arena;

pub use edge_arena::{EdgeArena, GlobalPredecessorIndex, PredecessorSource};
