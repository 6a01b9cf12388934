//! The Application Graph: the external collaborator exposing CFG shape.
//!
//! The bytecode/IR database and concrete CFG construction live outside
//! this crate entirely: the engine only ever calls through this trait,
//! generic over whatever `Statement`/`Method` types the caller's IR uses.

use std::fmt::Debug;
use std::hash::Hash;

/// Per-method entry/exit points, CFG successors, statement ownership, and
/// (possibly virtual, over-approximating) call resolution.
///
/// Implementations must be safe for concurrent read-only invocation. The
/// engine calls through `&self` from multiple Runner tasks.
pub trait ApplicationGraph: Send + Sync {
    type Statement: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    type Method: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Entry statements of `method`. A method may have more than one entry
    /// point (e.g. multiple constructors lowered into one IR method).
    fn entry_points(&self, method: &Self::Method) -> Vec<Self::Statement>;

    /// Exit statements of `method`.
    fn exit_points(&self, method: &Self::Method) -> Vec<Self::Statement>;

    /// CFG successors of `statement`.
    fn successors(&self, statement: &Self::Statement) -> Vec<Self::Statement>;

    /// The method that owns `statement`.
    fn method_of(&self, statement: &Self::Statement) -> Self::Method;

    /// Callees of a call-site statement. Empty for a call that resolves to
    /// nothing (e.g. an unresolvable virtual call, or a library stub);
    /// more than one for virtual dispatch over-approximation. Must only be
    /// called when `is_call_site` is true.
    fn callees(&self, call_site: &Self::Statement) -> Vec<Self::Method>;

    /// True iff `statement` is a call site. Distinct from "`callees` is
    /// non-empty": a call site with zero resolved callees still degenerates
    /// to call-to-return handling only, whereas a non-call statement never
    /// goes through call/return handling at all.
    fn is_call_site(&self, statement: &Self::Statement) -> bool;

    /// True iff `statement` is an exit point of its owning method. Default
    /// implementation checks membership in `exit_points(method_of(stmt))`;
    /// override when a cheaper tag-based check exists.
    fn is_exit_point(&self, statement: &Self::Statement) -> bool {
        let method = self.method_of(statement);
        self.exit_points(&method).contains(statement)
    }
}
