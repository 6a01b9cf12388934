/*
 * dataflow-ir: the pure, synchronous core of an interprocedural
 * dataflow solver.
 *
 * Feature-First Hexagonal Architecture:
 * - shared/   : Common models (Vertex, Edge, Reason, Subscription) and ports
 * - config/   : Analysis configuration (YAML-sourced, glob-classified)
 * - features/ : Vertical slices (ifds_engine: domain/ports/infrastructure/application)
 *
 * Everything here is `Send + Sync` and talks to the caller's IR only
 * through the `ApplicationGraph` / `FlowFunctions` / `SinkOracle` ports.
 * The async Manager and concurrency model live one layer up, in
 * `dataflow-orchestration`.
 */

#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod config;
pub mod features;
pub mod shared;

pub use features::ifds_engine;
pub use shared::models;
pub use shared::ports;
