//! The Runner: single-unit IFDS/IDE tabulation over the exploded
//! supergraph.
//!
//! A Runner owns exactly one unit's worklist, edge arena and summary
//! store. It never talks to another Runner directly: cross-unit
//! interaction is entirely message-based (`OutgoingMessage` /
//! `IncomingMessage`), so the same Runner code runs unmodified whether
//! it is driven in-process by a single-threaded test harness or by the
//! async Manager in `dataflow-orchestration`.

use super::super::domain::EdgeArena;
use super::super::ports::UnitResolver;
use super::messages::{IncomingMessage, OutgoingMessage};
use crate::shared::models::{DataflowFact, Edge, EdgeId, Reason, SummaryEdge, Subscription, UnitId, Vertex, Vulnerability};
use crate::shared::ports::{ApplicationGraph, FlowFunctions, SinkOracle};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Single-unit IFDS tabulation state.
pub struct Runner<G, F, FF, S>
where
    G: ApplicationGraph,
    F: DataflowFact,
{
    graph: Arc<G>,
    flow: Arc<FF>,
    sinks: Arc<S>,
    unit: UnitId,
    unit_resolver: Arc<dyn UnitResolver<G::Method>>,
    arena: EdgeArena<G::Statement, F>,
    worklist: VecDeque<EdgeId>,
    /// Caller edges waiting on summaries at a locally-owned entry vertex.
    callers: HashMap<Vertex<G::Statement, F>, Vec<EdgeId>>,
    /// Summaries published so far, per owning method.
    summaries: HashMap<G::Method, Vec<(EdgeId, SummaryEdge<G::Statement, F>)>>,
}

impl<G, F, FF, S> Runner<G, F, FF, S>
where
    G: ApplicationGraph,
    F: DataflowFact,
    FF: FlowFunctions<G, F>,
    S: SinkOracle<G, F>,
{
    pub fn new(
        graph: Arc<G>,
        flow: Arc<FF>,
        sinks: Arc<S>,
        unit: UnitId,
        unit_resolver: Arc<dyn UnitResolver<G::Method>>,
    ) -> Self {
        Self {
            graph,
            flow,
            sinks,
            arena: EdgeArena::new(unit.clone()),
            unit,
            unit_resolver,
            worklist: VecDeque::new(),
            callers: HashMap::new(),
            summaries: HashMap::new(),
        }
    }

    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    pub fn is_quiescent(&self) -> bool {
        self.worklist.is_empty()
    }

    pub fn arena(&self) -> &EdgeArena<G::Statement, F> {
        &self.arena
    }

    pub fn summaries_for(&self, method: &G::Method) -> &[(EdgeId, SummaryEdge<G::Statement, F>)] {
        self.summaries.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Seeds the worklist with `FlowFunctions::initial` at every entry
    /// point of every method assigned to this unit.
    pub fn seed(&mut self, methods: &[G::Method]) -> Vec<OutgoingMessage<G, F>> {
        let mut out = Vec::new();
        for method in methods {
            let facts = match self.flow.initial(method) {
                Ok(facts) => facts,
                Err(err) => {
                    tracing::warn!(?method, %err, "FlowFunctions::initial failed, skipping method");
                    continue;
                }
            };
            for entry in self.graph.entry_points(method) {
                for fact in facts.clone() {
                    let v = Vertex::new(entry.clone(), fact);
                    out.extend(self.add_path_edge(Edge::new(v.clone(), v), Reason::Initial));
                }
            }
        }
        out
    }

    /// Processes exactly one worklist entry, returning any messages that
    /// production produced. Empty worklist is a no-op.
    pub fn step(&mut self) -> Vec<OutgoingMessage<G, F>> {
        let Some(id) = self.worklist.pop_front() else {
            return Vec::new();
        };
        let edge = match self.arena.edge(&id) {
            Some(e) => e.clone(),
            None => return Vec::new(),
        };

        if self.graph.is_call_site(&edge.to.statement) {
            let mut out = self.process_call_to_return(&id, &edge);
            out.push(OutgoingMessage::UnresolvedCall {
                caller_edge: edge,
            });
            out
        } else if self.graph.is_exit_point(&edge.to.statement) {
            self.publish_summary(&id, &edge)
        } else {
            self.process_sequent(&id, &edge)
        }
    }

    /// Drains the worklist to local quiescence, collecting every message
    /// produced along the way. Does not process incoming messages;
    /// callers (tests or the Manager) interleave `drain` and
    /// `handle_incoming` as they see fit.
    pub fn drain(&mut self) -> Vec<OutgoingMessage<G, F>> {
        let mut out = Vec::new();
        while !self.worklist.is_empty() {
            out.extend(self.step());
        }
        out
    }

    pub fn handle_incoming(&mut self, msg: IncomingMessage<G, F>) -> Vec<OutgoingMessage<G, F>> {
        match msg {
            IncomingMessage::ResolvedCall {
                caller_edge,
                callee,
                callee_unit,
            } => self.handle_resolved_call(caller_edge, callee, callee_unit),
            IncomingMessage::SubscriptionOnStart(sub) => self.handle_subscription_on_start(sub),
            IncomingMessage::NotificationOnStart {
                caller_edge,
                summary_id,
                summary,
            } => self.handle_notification_on_start(caller_edge, summary_id, summary),
        }
    }

    fn add_path_edge(&mut self, edge: Edge<G::Statement, F>, reason: Reason) -> Vec<OutgoingMessage<G, F>> {
        let (id, is_new) = self.arena.intern(edge.clone());
        self.arena.add_reason(&id, reason);
        let mut out = Vec::new();
        if is_new {
            self.worklist.push_back(id.clone());
            if let Some(hit) = self.sinks.classify(&edge.to) {
                let mut vuln = Vulnerability::new(edge.to, hit.message);
                if let Some(rule) = hit.rule {
                    vuln = vuln.with_rule(rule);
                }
                out.push(OutgoingMessage::NewVulnerability {
                    sink_edge: id,
                    vulnerability: vuln,
                });
            }
        }
        out
    }

    fn process_call_to_return(
        &mut self,
        caller_id: &EdgeId,
        edge: &Edge<G::Statement, F>,
    ) -> Vec<OutgoingMessage<G, F>> {
        let mut out = Vec::new();
        let call_stmt = edge.to.statement.clone();
        for return_site in self.graph.successors(&call_stmt) {
            match self.flow.call_to_return(&call_stmt, &return_site, &edge.to.fact) {
                Ok(facts) => {
                    for fact in facts {
                        let new_edge = Edge::new(edge.from.clone(), Vertex::new(return_site.clone(), fact));
                        out.extend(self.add_path_edge(new_edge, Reason::CallToReturn(caller_id.clone())));
                    }
                }
                Err(err) => tracing::warn!(statement = ?call_stmt, %err, "call_to_return failed"),
            }
        }
        out
    }

    fn process_sequent(&mut self, id: &EdgeId, edge: &Edge<G::Statement, F>) -> Vec<OutgoingMessage<G, F>> {
        let mut out = Vec::new();
        let stmt = edge.to.statement.clone();
        for next in self.graph.successors(&stmt) {
            match self.flow.sequent(&stmt, &next, &edge.to.fact) {
                Ok(facts) => {
                    for fact in facts {
                        let new_edge = Edge::new(edge.from.clone(), Vertex::new(next.clone(), fact));
                        out.extend(self.add_path_edge(new_edge, Reason::Sequent(id.clone())));
                    }
                }
                Err(err) => tracing::warn!(statement = ?stmt, %err, "sequent failed"),
            }
        }
        out
    }

    fn publish_summary(&mut self, id: &EdgeId, edge: &Edge<G::Statement, F>) -> Vec<OutgoingMessage<G, F>> {
        let method = self.graph.method_of(&edge.to.statement);
        let summary = SummaryEdge::new(edge.clone());
        let bucket = self.summaries.entry(method.clone()).or_default();
        if bucket.iter().any(|(existing, _)| existing == id) {
            return Vec::new();
        }
        bucket.push((id.clone(), summary.clone()));

        let mut out = vec![OutgoingMessage::NewSummaryEdge {
            method,
            summary_id: id.clone(),
            summary: summary.clone(),
        }];

        let waiting = self.callers.get(&edge.from).cloned().unwrap_or_default();
        for caller_id in waiting {
            out.extend(self.replay_exit_to_return_site(&caller_id, id, &summary));
        }
        out
    }

    fn return_propagation_targets(
        &self,
        caller_edge: &Edge<G::Statement, F>,
        summary: &SummaryEdge<G::Statement, F>,
    ) -> Vec<(G::Statement, F)> {
        let call_stmt = &caller_edge.to.statement;
        let mut targets = Vec::new();
        for return_site in self.graph.successors(call_stmt) {
            match self.flow.exit_to_return_site(
                call_stmt,
                &return_site,
                &summary.edge().to.statement,
                &summary.edge().to.fact,
            ) {
                Ok(facts) => targets.extend(facts.into_iter().map(|f| (return_site.clone(), f))),
                Err(err) => tracing::warn!(%err, "exit_to_return_site failed"),
            }
        }
        targets
    }

    /// Replays a summary that was just discovered locally against a
    /// caller registered in `self.callers`.
    fn replay_exit_to_return_site(
        &mut self,
        caller_id: &EdgeId,
        summary_id: &EdgeId,
        summary: &SummaryEdge<G::Statement, F>,
    ) -> Vec<OutgoingMessage<G, F>> {
        let Some(caller_edge) = self.arena.edge(caller_id).cloned() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (stmt, fact) in self.return_propagation_targets(&caller_edge, summary) {
            let new_edge = Edge::new(caller_edge.from.clone(), Vertex::new(stmt, fact));
            out.extend(self.add_path_edge(
                new_edge,
                Reason::ExitToReturnSite {
                    caller: caller_id.clone(),
                    summary: summary_id.clone(),
                },
            ));
        }
        out
    }

    /// Replays an *already-known* summary, either because the caller
    /// registered after the summary existed, or because it arrived
    /// cross-unit via `NotificationOnStart`.
    fn replay_through_summary(
        &mut self,
        caller_id: &EdgeId,
        summary_id: &EdgeId,
        summary: &SummaryEdge<G::Statement, F>,
    ) -> Vec<OutgoingMessage<G, F>> {
        let Some(caller_edge) = self.arena.edge(caller_id).cloned() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (stmt, fact) in self.return_propagation_targets(&caller_edge, summary) {
            let new_edge = Edge::new(caller_edge.from.clone(), Vertex::new(stmt, fact));
            out.extend(self.add_path_edge(
                new_edge,
                Reason::ThroughSummary {
                    pred: caller_id.clone(),
                    summary: summary_id.clone(),
                },
            ));
        }
        out
    }

    fn summaries_at(
        &self,
        method: &G::Method,
        vertex: &Vertex<G::Statement, F>,
    ) -> Vec<(EdgeId, SummaryEdge<G::Statement, F>)> {
        self.summaries
            .get(method)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|(_, summary)| &summary.edge().from == vertex)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn handle_resolved_call(
        &mut self,
        caller_edge: Edge<G::Statement, F>,
        callee: G::Method,
        callee_unit: UnitId,
    ) -> Vec<OutgoingMessage<G, F>> {
        let Some(caller_id) = self.arena.id_of(&caller_edge) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for entry in self.graph.entry_points(&callee) {
            let facts = match self.flow.call_to_start(&caller_edge.to.statement, &entry, &caller_edge.to.fact) {
                Ok(facts) => facts,
                Err(err) => {
                    tracing::warn!(%err, "call_to_start failed");
                    continue;
                }
            };
            for fact in facts {
                let v = Vertex::new(entry.clone(), fact);
                if callee_unit == self.unit {
                    self.callers.entry(v.clone()).or_default().push(caller_id.clone());
                    for (summary_id, summary) in self.summaries_at(&callee, &v) {
                        out.extend(self.replay_through_summary(&caller_id, &summary_id, &summary));
                    }
                    out.extend(self.add_path_edge(Edge::new(v.clone(), v), Reason::CallToStart(caller_id.clone())));
                } else {
                    out.push(OutgoingMessage::SubscriptionOnStart(Subscription::new(
                        self.unit.clone(),
                        callee_unit.clone(),
                        caller_edge.clone(),
                        v,
                    )));
                }
            }
        }
        out
    }

    /// Another unit is now waiting on summaries at `v`, a vertex this unit
    /// owns. The wait may be entirely prospective (this unit hasn't even
    /// started on `v` yet) or it may arrive after the summary was already
    /// published. A subscription can resolve arbitrarily late, so any
    /// already-known summary at `v` must be re-announced here
    /// rather than only relying on future `publish_summary` calls, which
    /// only replay against *locally* registered callers.
    fn handle_subscription_on_start(&mut self, sub: Subscription<G::Statement, F>) -> Vec<OutgoingMessage<G, F>> {
        let v = sub.callee_entry;
        let method = self.graph.method_of(&v.statement);
        let mut out = self.add_path_edge(Edge::new(v.clone(), v.clone()), Reason::External);
        for (summary_id, summary) in self.summaries_at(&method, &v) {
            out.push(OutgoingMessage::NewSummaryEdge {
                method: method.clone(),
                summary_id,
                summary,
            });
        }
        out
    }

    fn handle_notification_on_start(
        &mut self,
        caller_edge: Edge<G::Statement, F>,
        summary_id: EdgeId,
        summary: SummaryEdge<G::Statement, F>,
    ) -> Vec<OutgoingMessage<G, F>> {
        let Some(caller_id) = self.arena.id_of(&caller_edge) else {
            return Vec::new();
        };
        self.replay_through_summary(&caller_id, &summary_id, &summary)
    }

    /// True iff `resolve_unit(method) == self.unit`. Exposed so the
    /// Manager can ask a Runner to double-check a unit assignment without
    /// re-deriving it from scratch.
    pub fn owns(&self, method: &G::Method) -> bool {
        self.unit_resolver.resolve(method) == self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ifds_engine::ports::UnitResolver as UnitResolverTrait;
    use crate::shared::ports::{FlowResult, SinkHit};
    use std::collections::HashSet;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Fact(u8);

    impl DataflowFact for Fact {
        fn zero() -> Self {
            Fact(0)
        }
        fn is_zero(&self) -> bool {
            self.0 == 0
        }
    }

    /// A single-method graph: `entry -> exit`, no calls, no branching,
    /// just enough to drive a Runner through seed/drain/publish_summary in
    /// isolation.
    struct OneMethodGraph;

    impl ApplicationGraph for OneMethodGraph {
        type Statement = &'static str;
        type Method = &'static str;

        fn entry_points(&self, _method: &&'static str) -> Vec<&'static str> {
            vec!["entry"]
        }
        fn exit_points(&self, _method: &&'static str) -> Vec<&'static str> {
            vec!["exit"]
        }
        fn successors(&self, statement: &&'static str) -> Vec<&'static str> {
            match *statement {
                "entry" => vec!["exit"],
                _ => vec![],
            }
        }
        fn method_of(&self, _statement: &&'static str) -> &'static str {
            "f"
        }
        fn callees(&self, _call_site: &&'static str) -> Vec<&'static str> {
            vec![]
        }
        fn is_call_site(&self, _statement: &&'static str) -> bool {
            false
        }
    }

    struct IdentityFlow;

    impl FlowFunctions<OneMethodGraph, Fact> for IdentityFlow {
        fn initial(&self, _method: &&'static str) -> FlowResult<Fact> {
            Ok(HashSet::from([Fact::zero()]))
        }
        fn sequent(&self, _current: &&'static str, _next: &&'static str, fact: &Fact) -> FlowResult<Fact> {
            Ok(HashSet::from([*fact]))
        }
        fn call_to_return(&self, _call: &&'static str, _return_site: &&'static str, fact: &Fact) -> FlowResult<Fact> {
            Ok(HashSet::from([*fact]))
        }
        fn call_to_start(&self, _call: &&'static str, _callee_entry: &&'static str, fact: &Fact) -> FlowResult<Fact> {
            Ok(HashSet::from([*fact]))
        }
        fn exit_to_return_site(
            &self,
            _call: &&'static str,
            _return_site: &&'static str,
            _exit: &&'static str,
            fact: &Fact,
        ) -> FlowResult<Fact> {
            Ok(HashSet::from([*fact]))
        }
    }

    struct NoSinks;

    impl SinkOracle<OneMethodGraph, Fact> for NoSinks {
        fn classify(&self, _vertex: &crate::shared::models::Vertex<&'static str, Fact>) -> Option<SinkHit> {
            None
        }
    }

    struct AlwaysOther;

    impl UnitResolverTrait<&'static str> for AlwaysOther {
        fn resolve(&self, _method: &&'static str) -> UnitId {
            UnitId::Singleton
        }
    }

    /// A subscription that arrives *after* the callee unit already
    /// published its summary must still be answered. The summary cannot
    /// simply be lost because no caller was registered yet at publish
    /// time, and a late-arriving message can reactivate a Runner that has
    /// already quiesced.
    #[test]
    fn late_subscription_still_sees_an_already_published_summary() {
        let mut callee = Runner::new(
            Arc::new(OneMethodGraph),
            Arc::new(IdentityFlow),
            Arc::new(NoSinks),
            UnitId::Method("f".into()),
            Arc::new(AlwaysOther),
        );

        // Run the callee to quiescence first, so its summary for the ZERO
        // entry fact is published with zero registered callers.
        let mut msgs = callee.seed(&["f"]);
        msgs.extend(callee.drain());
        assert!(
            msgs.iter().any(|m| matches!(m, OutgoingMessage::NewSummaryEdge { .. })),
            "callee should have published its summary before any subscription exists"
        );
        assert_eq!(callee.summaries_for(&"f").len(), 1);

        // Only *now* does a subscription for that same entry vertex arrive.
        let entry_vertex = Vertex::new("entry", Fact::zero());
        let sub = Subscription::new(
            UnitId::Singleton,
            UnitId::Method("f".into()),
            Edge::new(Vertex::new("call", Fact::zero()), Vertex::new("call", Fact::zero())),
            entry_vertex,
        );
        let out = callee.handle_incoming(IncomingMessage::SubscriptionOnStart(sub));

        assert!(
            out.iter().any(|m| matches!(m, OutgoingMessage::NewSummaryEdge { .. })),
            "a late subscription must still be told about an already-known summary"
        );
    }
}
