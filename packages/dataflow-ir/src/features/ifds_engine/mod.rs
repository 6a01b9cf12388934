//! The IFDS/IDE tabulation engine: the Runner, Unit Resolvers, the
//! Trace-Graph Builder, and the synchronous single-unit driver built on
//! top of them.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{merge_arenas, AnalysisReport, InProcessEngine};
pub use domain::{EdgeArena, GlobalPredecessorIndex, PredecessorSource};
pub use infrastructure::{
    CachingUnitResolver, ClassUnitResolver, CustomUnitResolver, IncomingMessage,
    MethodUnitResolver, OutgoingMessage, PackageUnitResolver, Runner, SingletonUnitResolver,
    TraceGraph, TraceGraphBuilder,
};
pub use ports::UnitResolver;
