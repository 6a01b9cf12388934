//! The flow-function contract.
//!
//! Five pure functions, each a finite, fully materialized set of output
//! facts (no lazy generator streams: the engine always fully consumes
//! whatever a flow function produces). A function that cannot compute its
//! result (rather than correctly producing an empty set) returns
//! `Err(FlowError)`; the engine drops just that edge and logs a warning,
//! it never aborts the run.

use super::application_graph::ApplicationGraph;
use crate::shared::models::DataflowFact;
use std::collections::HashSet;
use std::fmt;

/// A flow function could not be evaluated for the given inputs.
#[derive(Debug, Clone)]
pub struct FlowError(pub String);

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow function failed: {}", self.0)
    }
}

impl std::error::Error for FlowError {}

pub type FlowResult<F> = Result<HashSet<F>, FlowError>;

/// Deterministic, side-effect-free transfer functions over a user-defined
/// fact domain, parameterised by the `ApplicationGraph` that supplies
/// statement/method identities.
///
/// Implementations must not observe mutable global state: given the same
/// statement/fact inputs, they must always return the same output set.
pub trait FlowFunctions<G: ApplicationGraph, F: DataflowFact>: Send + Sync {
    /// Seed facts at `method`'s entry. Typically `{F::zero()}`.
    fn initial(&self, method: &G::Method) -> FlowResult<F>;

    /// Intra-procedural transfer over a non-call, non-exit edge
    /// `current -> next`.
    fn sequent(&self, current: &G::Statement, next: &G::Statement, fact: &F) -> FlowResult<F>;

    /// The effect of a call without descending into callees. Handles
    /// library stubs, sanitisation, or taint propagation through
    /// unresolved calls.
    fn call_to_return(
        &self,
        call: &G::Statement,
        return_site: &G::Statement,
        fact: &F,
    ) -> FlowResult<F>;

    /// Facts to seed a callee's entry when opening an interprocedural edge.
    fn call_to_start(
        &self,
        call: &G::Statement,
        callee_entry: &G::Statement,
        fact: &F,
    ) -> FlowResult<F>;

    /// Maps a summary from a callee's exit back into the caller's scope at
    /// the return site.
    fn exit_to_return_site(
        &self,
        call: &G::Statement,
        return_site: &G::Statement,
        exit: &G::Statement,
        fact: &F,
    ) -> FlowResult<F>;
}
