//! The data model shared by every part of the solver: facts, vertices,
//! edges, reasons, units, vulnerabilities and subscriptions.

mod edge;
mod fact;
mod reason;
mod subscription;
mod unit;
mod vertex;
mod vulnerability;

pub use edge::{Edge, EdgeId, SummaryEdge};
pub use fact::DataflowFact;
pub use reason::Reason;
pub use subscription::Subscription;
pub use unit::UnitId;
pub use vertex::Vertex;
pub use vulnerability::{TraceRecord, Vulnerability, VulnerabilityReport};
