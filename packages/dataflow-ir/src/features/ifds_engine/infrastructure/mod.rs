//! Concrete implementations of the IFDS engine: the Runner, the built-in
//! Unit Resolvers, the message catalogue, and the Trace-Graph Builder.

mod messages;
mod runner;
mod trace_graph;
mod unit_resolver;

pub use messages::{IncomingMessage, OutgoingMessage};
pub use runner::Runner;
pub use trace_graph::{TraceGraph, TraceGraphBuilder};
pub use unit_resolver::{
    CachingUnitResolver, ClassUnitResolver, CustomUnitResolver, MethodUnitResolver,
    PackageUnitResolver, SingletonUnitResolver,
};
