/*
 * External interfaces (ports), hexagonal-architecture style.
 *
 * Architecture:
 * ```
 *          +------------------------------+
 *          |   Manager / Runner (core)    |
 *          +---------------+--------------+
 *                          | calls
 *            +-------------v-------------+
 *            |   ApplicationGraph (CFG)   |  <- external IR, out of scope
 *            |   FlowFunctions (facts)    |  <- external analysis, out of scope
 *            |   SinkOracle (sink rules)  |  <- external analysis, out of scope
 *            +----------------------------+
 * ```
 *
 * Everything the engine needs from the surrounding system flows through
 * these three traits; nothing else is assumed about the caller's IR or
 * analysis.
 */

mod application_graph;
mod flow_functions;
mod sink_oracle;

pub use application_graph::ApplicationGraph;
pub use flow_functions::{FlowError, FlowFunctions, FlowResult};
pub use sink_oracle::{SinkHit, SinkOracle};
