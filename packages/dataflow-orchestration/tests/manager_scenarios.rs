//! Integration tests driving the real async `Manager` over small
//! synthetic programs: the cross-unit, recursion, and cancellation
//! scenarios that `dataflow-ir`'s single-unit `InProcessEngine` tests
//! cannot exercise on their own.

use dataflow_ir::ifds_engine::{ClassUnitResolver, SingletonUnitResolver, TraceGraphBuilder};
use dataflow_ir::models::{DataflowFact, UnitId};
use dataflow_ir::ports::{ApplicationGraph, FlowFunctions, FlowResult, SinkHit, SinkOracle};
use dataflow_orchestration::Manager;
use pretty_assertions::assert_eq;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Taint {
    Zero,
    Tainted,
}

impl DataflowFact for Taint {
    fn zero() -> Self {
        Taint::Zero
    }
    fn is_zero(&self) -> bool {
        matches!(self, Taint::Zero)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Plain,
    Source,
}

/// Same hand-built-CFG fixture style as `dataflow-ir`'s own
/// `ifds_scenarios.rs`, duplicated here because it is test-only fixture
/// code, not production code the two crates could share.
#[derive(Default)]
struct Program {
    entries: HashMap<String, Vec<String>>,
    exits: HashMap<String, Vec<String>>,
    successors: HashMap<String, Vec<String>>,
    method_of: HashMap<String, String>,
    callees: HashMap<String, Vec<String>>,
    kinds: HashMap<String, Kind>,
    sinks: HashSet<String>,
}

impl Program {
    fn method(&mut self, name: &str, stmts: &[&str]) -> &mut Self {
        let stmts: Vec<String> = stmts.iter().map(|s| format!("{name}:{s}")).collect();
        for w in stmts.windows(2) {
            self.successors.entry(w[0].clone()).or_default().push(w[1].clone());
        }
        for s in &stmts {
            self.method_of.insert(s.clone(), name.to_string());
            self.kinds.entry(s.clone()).or_insert(Kind::Plain);
        }
        self.entries.insert(name.to_string(), vec![stmts[0].clone()]);
        self.exits.insert(name.to_string(), vec![stmts.last().unwrap().clone()]);
        self
    }

    fn tag(&mut self, stmt: &str, kind: Kind) -> &mut Self {
        self.kinds.insert(stmt.to_string(), kind);
        self
    }

    fn sink(&mut self, stmt: &str) -> &mut Self {
        self.sinks.insert(stmt.to_string());
        self
    }

    fn call(&mut self, call_stmt: &str, callees: &[&str]) -> &mut Self {
        self.callees.insert(call_stmt.to_string(), callees.iter().map(|s| s.to_string()).collect());
        self
    }
}

struct TestGraph(Program);

impl ApplicationGraph for TestGraph {
    type Statement = String;
    type Method = String;

    fn entry_points(&self, method: &String) -> Vec<String> {
        self.0.entries.get(method).cloned().unwrap_or_default()
    }

    fn exit_points(&self, method: &String) -> Vec<String> {
        self.0.exits.get(method).cloned().unwrap_or_default()
    }

    fn successors(&self, statement: &String) -> Vec<String> {
        self.0.successors.get(statement).cloned().unwrap_or_default()
    }

    fn method_of(&self, statement: &String) -> String {
        self.0.method_of.get(statement).cloned().unwrap_or_else(|| panic!("unknown statement {statement}"))
    }

    fn callees(&self, call_site: &String) -> Vec<String> {
        self.0.callees.get(call_site).cloned().unwrap_or_default()
    }

    fn is_call_site(&self, statement: &String) -> bool {
        self.0.callees.contains_key(statement)
    }
}

struct TaintFlow {
    kinds: HashMap<String, Kind>,
    /// Call sites with at least one known callee. A resolved call's effect
    /// on a tainted fact is carried by call-to-start/exit-to-return, so
    /// call-to-return only needs to keep the zero fact flowing past it;
    /// otherwise the same return-site vertex would be re-derived twice,
    /// once by each path.
    resolved_calls: HashSet<String>,
}

impl FlowFunctions<TestGraph, Taint> for TaintFlow {
    fn initial(&self, _method: &String) -> FlowResult<Taint> {
        Ok(HashSet::from([Taint::Zero]))
    }

    fn sequent(&self, current: &String, _next: &String, fact: &Taint) -> FlowResult<Taint> {
        match self.kinds.get(current) {
            Some(Kind::Source) => Ok(HashSet::from([Taint::Tainted])),
            _ => Ok(HashSet::from([*fact])),
        }
    }

    fn call_to_return(&self, call: &String, _return_site: &String, fact: &Taint) -> FlowResult<Taint> {
        if self.resolved_calls.contains(call) {
            match fact {
                Taint::Zero => Ok(HashSet::from([Taint::Zero])),
                Taint::Tainted => Ok(HashSet::new()),
            }
        } else {
            Ok(HashSet::from([*fact]))
        }
    }

    fn call_to_start(&self, _call: &String, _callee_entry: &String, fact: &Taint) -> FlowResult<Taint> {
        Ok(HashSet::from([*fact]))
    }

    fn exit_to_return_site(
        &self,
        _call: &String,
        _return_site: &String,
        _exit: &String,
        fact: &Taint,
    ) -> FlowResult<Taint> {
        Ok(HashSet::from([*fact]))
    }
}

struct TaintSinks {
    sinks: HashSet<String>,
}

impl SinkOracle<TestGraph, Taint> for TaintSinks {
    fn classify(&self, vertex: &dataflow_ir::models::Vertex<String, Taint>) -> Option<SinkHit> {
        if self.sinks.contains(&vertex.statement) && vertex.fact == Taint::Tainted {
            Some(SinkHit::new("tainted value reaches sink"))
        } else {
            None
        }
    }
}

fn build(program: Program) -> (Arc<TestGraph>, Arc<TaintFlow>, Arc<TaintSinks>) {
    let kinds = program.kinds.clone();
    let sinks = program.sinks.clone();
    let resolved_calls = program
        .callees
        .iter()
        .filter(|(_, callees)| !callees.is_empty())
        .map(|(call, _)| call.clone())
        .collect();
    let graph = Arc::new(TestGraph(program));
    let flow = Arc::new(TaintFlow { kinds, resolved_calls });
    let sink_oracle = Arc::new(TaintSinks { sinks });
    (graph, flow, sink_oracle)
}

#[tokio::test]
async fn straight_line_taint_through_a_single_unit() {
    let mut program = Program::default();
    program.method("main", &["1", "2", "3"]);
    program.tag("main:1", Kind::Source);
    program.sink("main:3");

    let (graph, flow, sinks) = build(program);
    let resolver: Arc<SingletonUnitResolver<String>> = Arc::new(SingletonUnitResolver::new());
    let manager = Manager::new(graph, flow, sinks, resolver);

    let (report, index) = manager
        .run(&["main".to_string()], CancellationToken::new())
        .await
        .expect("run should succeed");

    assert_eq!(report.hits.len(), 1);
    assert!(!report.partial);

    let builder = TraceGraphBuilder::new(&index, 10, None);
    let trace = builder.build(&report.hits[0].sink_edge);
    assert_eq!(trace.traces.len(), 1);

    assert_eq!(manager.history().len(), 1);
    assert_eq!(manager.history().get(report.run_id).unwrap().vulnerability_count, 1);
}

/// The genuine cross-unit scenario: `main` and `f` are
/// assigned to different units by a resolver that splits on the method's
/// class prefix, so the summary for `f` must cross a real tokio-task
/// boundary, through `UnresolvedCall` -> `SubscriptionOnStart` ->
/// `NewSummaryEdge` -> `NotificationOnStart`, before `main`'s Runner can
/// see it and report the sink hit.
#[tokio::test]
async fn cross_unit_summary_routing_finds_the_vulnerability() {
    let mut program = Program::default();
    program.method("Callee.f", &["entry", "exit"]);
    program.method("Caller.main", &["1", "2", "3"]);
    program.tag("Caller.main:1", Kind::Source);
    program.call("Caller.main:2", &["Callee.f"]);
    program.sink("Caller.main:3");

    let (graph, flow, sinks) = build(program);
    let resolver = Arc::new(ClassUnitResolver::new(|m: &String| {
        m.split('.').next().unwrap().to_string()
    }));
    let manager = Manager::new(graph, flow, sinks, resolver);

    let (report, index) = manager
        .run(&["Caller.main".to_string(), "Callee.f".to_string()], CancellationToken::new())
        .await
        .expect("run should succeed");

    assert_eq!(report.hits.len(), 1);
    assert!(!report.partial);

    let builder = TraceGraphBuilder::new(&index, 10, None);
    let trace = builder.build(&report.hits[0].sink_edge);
    assert_eq!(trace.traces.len(), 1);
    assert_eq!(
        trace.traces[0].iter().map(|v| v.statement.as_str()).collect::<Vec<_>>(),
        vec!["Caller.main:1", "Caller.main:2", "Callee.f:entry", "Callee.f:exit", "Caller.main:3"],
        "the witness must run through f's entry and exit in the other unit's arena"
    );
}

#[tokio::test]
async fn cross_unit_sanitizer_blocks_the_cross_unit_flow() {
    let mut program = Program::default();
    program.method("Callee.f", &["entry", "exit"]);
    program.method("Caller.main", &["1", "2", "3"]);
    program.call("Caller.main:2", &["Callee.f"]);
    program.sink("Caller.main:3");
    // No source tagged anywhere: the cross-unit call must not itself
    // manufacture taint.

    let (graph, flow, sinks) = build(program);
    let resolver = Arc::new(ClassUnitResolver::new(|m: &String| {
        m.split('.').next().unwrap().to_string()
    }));
    let manager = Manager::new(graph, flow, sinks, resolver);

    let (report, _index) = manager
        .run(&["Caller.main".to_string(), "Callee.f".to_string()], CancellationToken::new())
        .await
        .expect("run should succeed");

    assert!(report.hits.is_empty());
}

#[tokio::test]
async fn recursive_method_terminates_across_the_manager() {
    let mut program = Program::default();
    program.method("f", &["entry", "check", "exit"]);
    program.call("f:check", &["f"]);

    let (graph, flow, sinks) = build(program);
    let resolver: Arc<SingletonUnitResolver<String>> = Arc::new(SingletonUnitResolver::new());
    let manager = Manager::new(graph, flow, sinks, resolver);

    let (report, _index) = manager
        .run(&["f".to_string()], CancellationToken::new())
        .await
        .expect("recursive run should still reach quiescence");

    assert!(report.hits.is_empty());
    assert!(!report.partial);
}

/// Each Runner releases its worklist promptly and the Manager surfaces a
/// partial result when cancelled before quiescence.
#[tokio::test]
async fn cancelling_before_quiescence_yields_a_partial_report() {
    let mut program = Program::default();
    program.method("main", &["1", "2", "3"]);
    program.tag("main:1", Kind::Source);
    program.sink("main:3");

    let (graph, flow, sinks) = build(program);
    let resolver: Arc<SingletonUnitResolver<String>> = Arc::new(SingletonUnitResolver::new());
    let manager = Manager::new(graph, flow, sinks, resolver);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let (report, _index) = manager
        .run(&["main".to_string()], cancel)
        .await
        .expect("a cancelled run still returns Ok with partial=true");

    assert!(report.partial);
}

#[tokio::test]
async fn virtual_dispatch_across_units_unions_both_overrides() {
    let mut program = Program::default();
    program.method("A.m", &["entry", "exit"]);
    program.tag("A.m:entry", Kind::Source);
    program.method("B.m", &["entry", "exit"]);
    program.method("Caller.main", &["1", "2"]);
    program.call("Caller.main:1", &["A.m", "B.m"]);
    program.sink("Caller.main:2");

    let (graph, flow, sinks) = build(program);
    let resolver = Arc::new(ClassUnitResolver::new(|m: &String| {
        m.split('.').next().unwrap().to_string()
    }));
    let manager = Manager::new(graph, flow, sinks, resolver);

    let (report, _index) = manager
        .run(
            &["Caller.main".to_string(), "A.m".to_string(), "B.m".to_string()],
            CancellationToken::new(),
        )
        .await
        .expect("run should succeed");

    assert_eq!(report.hits.len(), 1);
}
