//! The async Manager: spawns one task per unit Runner, routes the six
//! cross-unit message kinds over `tokio::sync::mpsc` channels, and
//! detects global quiescence.
//!
//! The coroutine/async-based Manager-Runner coupling is modelled here as
//! a task pool with typed channels. Every unit gets its own
//! `tokio::task` and its own inbox; nothing is shared between Runners
//! except by message.

use dataflow_ir::ifds_engine::{EdgeArena, IncomingMessage, OutgoingMessage, Runner, UnitResolver};
use dataflow_ir::models::{DataflowFact, Subscription, UnitId};
use dataflow_ir::ports::{ApplicationGraph, FlowFunctions, SinkOracle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};
use crate::history::RunHistory;
use crate::report::{AggregatedReport, Hit};

/// Routed on the shared event channel every unit task feeds into.
enum Event<G: ApplicationGraph, F> {
    Outgoing { unit: UnitId, message: OutgoingMessage<G, F> },
    Idle { unit: UnitId },
    Done { unit: UnitId, arena: EdgeArena<G::Statement, F> },
}

/// Cross-unit coordinator. Holds the shared, read-only collaborators every
/// Runner needs. The Application Graph and flow functions must be safe
/// for concurrent read-only invocation, and spawns one Runner task per
/// unit on demand.
pub struct Manager<G, F, FF, S>
where
    G: ApplicationGraph,
    F: DataflowFact,
{
    graph: Arc<G>,
    flow: Arc<FF>,
    sinks: Arc<S>,
    resolver: Arc<dyn UnitResolver<G::Method>>,
    history: RunHistory,
}

impl<G, F, FF, S> Manager<G, F, FF, S>
where
    G: ApplicationGraph + 'static,
    F: DataflowFact,
    FF: FlowFunctions<G, F> + 'static,
    S: SinkOracle<G, F> + 'static,
{
    pub fn new(
        graph: Arc<G>,
        flow: Arc<FF>,
        sinks: Arc<S>,
        resolver: Arc<dyn UnitResolver<G::Method>>,
    ) -> Self {
        Self {
            graph,
            flow,
            sinks,
            resolver,
            history: RunHistory::new(),
        }
    }

    /// The log of every run this Manager has completed so far, keyed by
    /// `run_id`. Shared (cheaply cloned) state; callers may hold on to a
    /// clone of it across many `run` calls.
    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    /// Runs every method in `seed_methods` to global quiescence (or until
    /// `cancel` fires), returning the aggregated vulnerabilities and a
    /// merged predecessor index suitable for trace reconstruction.
    ///
    /// Each call is assigned a fresh `run_id`, recorded in `self.history()`
    /// once the run finishes (or is cancelled).
    #[tracing::instrument(skip_all, fields(seed_methods = seed_methods.len(), run_id = tracing::field::Empty))]
    pub async fn run(
        &self,
        seed_methods: &[G::Method],
        cancel: CancellationToken,
    ) -> Result<(AggregatedReport<G::Statement, F>, dataflow_ir::ifds_engine::GlobalPredecessorIndex<G::Statement, F>)>
    {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let mut per_unit: HashMap<UnitId, Vec<G::Method>> = HashMap::new();
        for method in seed_methods {
            let unit = self.resolver.resolve(method);
            per_unit.entry(unit).or_default().push(method.clone());
        }

        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<Event<G, F>>();
        let mut inboxes: HashMap<UnitId, mpsc::UnboundedSender<IncomingMessage<G, F>>> = HashMap::new();
        let mut handles: HashMap<UnitId, JoinHandle<()>> = HashMap::new();
        let mut inflight: HashMap<UnitId, i64> = HashMap::new();

        for (unit, methods) in per_unit {
            self.spawn_unit(unit.clone(), methods, events_tx.clone(), cancel.clone(), &mut inboxes, &mut handles);
            inflight.insert(unit, 1);
        }

        let mut report = AggregatedReport::new(run_id);
        let mut pending_subscriptions: HashMap<UnitId, Vec<Subscription<G::Statement, F>>> = HashMap::new();
        let mut arenas: HashMap<UnitId, EdgeArena<G::Statement, F>> = HashMap::new();
        let mut done_units = 0usize;
        let total_units_at_start = inflight.len();
        let mut spawned_total = total_units_at_start;

        loop {
            if cancel.is_cancelled() {
                report.partial = true;
                break;
            }
            if inflight.values().all(|&c| c == 0) && pending_subscriptions.values().all(Vec::is_empty) {
                debug!("global quiescence reached, every unit idle and no subscriptions pending");
                break;
            }

            let event = tokio::select! {
                _ = cancel.cancelled() => { report.partial = true; break; }
                event = events_rx.recv() => match event {
                    Some(e) => e,
                    None => break,
                },
            };

            match event {
                Event::Idle { unit } => {
                    let counter = inflight.entry(unit.clone()).or_insert(0);
                    *counter -= 1;
                    if *counter < 0 {
                        warn!(?unit, "idle reported more times than messages routed; clamping");
                        *counter = 0;
                    }
                }
                Event::Done { unit, arena } => {
                    arenas.insert(unit, arena);
                    done_units += 1;
                    if done_units == spawned_total && inflight.values().all(|&c| c == 0) {
                        break;
                    }
                }
                Event::Outgoing { unit, message } => match message {
                    OutgoingMessage::NewVulnerability { sink_edge, vulnerability } => {
                        report.hits.push(Hit {
                            unit,
                            sink_edge,
                            vulnerability,
                        });
                    }
                    OutgoingMessage::NewSummaryEdge { method, summary_id, summary } => {
                        *report.summary_counts.entry(format!("{method:?}")).or_insert(0) += 1;

                        if let Some(subs) = pending_subscriptions.get_mut(&unit) {
                            let mut still_waiting = Vec::with_capacity(subs.len());
                            for sub in subs.drain(..) {
                                if sub.matches(&summary.edge().from) {
                                    let subscriber = sub.subscriber.clone();
                                    self.route_and_spawn_if_needed(
                                        &subscriber,
                                        IncomingMessage::NotificationOnStart {
                                            caller_edge: sub.caller_edge.clone(),
                                            summary_id: summary_id.clone(),
                                            summary: summary.clone(),
                                        },
                                        &events_tx,
                                        &cancel,
                                        &mut inboxes,
                                        &mut handles,
                                        &mut inflight,
                                        &mut spawned_total,
                                    );
                                } else {
                                    still_waiting.push(sub);
                                }
                            }
                            *subs = still_waiting;
                        }
                    }
                    OutgoingMessage::SubscriptionOnStart(sub) => {
                        let target = sub.target.clone();
                        pending_subscriptions.entry(target.clone()).or_default().push(sub.clone());
                        self.route_and_spawn_if_needed(
                            &target,
                            IncomingMessage::SubscriptionOnStart(sub),
                            &events_tx,
                            &cancel,
                            &mut inboxes,
                            &mut handles,
                            &mut inflight,
                            &mut spawned_total,
                        );
                    }
                    OutgoingMessage::UnresolvedCall { caller_edge } => {
                        let call_stmt = caller_edge.to.statement.clone();
                        for callee in self.graph.callees(&call_stmt) {
                            let callee_unit = self.resolver.resolve(&callee);
                            self.route_and_spawn_if_needed(
                                &unit,
                                IncomingMessage::ResolvedCall {
                                    caller_edge: caller_edge.clone(),
                                    callee,
                                    callee_unit,
                                },
                                &events_tx,
                                &cancel,
                                &mut inboxes,
                                &mut handles,
                                &mut inflight,
                                &mut spawned_total,
                            );
                        }
                    }
                },
            }
        }

        if cancel.is_cancelled() {
            for handle in handles.values() {
                handle.abort();
            }
        }
        // Dropping every inbox sender makes `inbox.recv()` return `None` in
        // any unit task still looping, so each task exits and reaches its
        // `Event::Done` send on its own; awaiting the handles below just
        // joins work that is already finished or finishing.
        drop(inboxes);
        for (unit, handle) in handles {
            match handle.await {
                Ok(()) => {}
                Err(join_err) if join_err.is_cancelled() => {}
                Err(join_err) => return Err(OrchestratorError::UnitTaskFailed(unit, join_err.to_string())),
            }
        }

        let index = dataflow_ir::ifds_engine::merge_arenas(arenas.into_values());

        info!(hits = report.hits.len(), partial = report.partial, "run finished");
        self.history.record(report.summary());
        Ok((report, index))
    }

    /// Routes `message` to `target`'s inbox, spawning a Runner for it
    /// first if this is the first time any message has referenced that
    /// unit (units are only known lazily, as calls/subscriptions resolve
    /// into them).
    #[allow(clippy::too_many_arguments)]
    fn route_and_spawn_if_needed(
        &self,
        target: &UnitId,
        message: IncomingMessage<G, F>,
        events_tx: &mpsc::UnboundedSender<Event<G, F>>,
        cancel: &CancellationToken,
        inboxes: &mut HashMap<UnitId, mpsc::UnboundedSender<IncomingMessage<G, F>>>,
        handles: &mut HashMap<UnitId, JoinHandle<()>>,
        inflight: &mut HashMap<UnitId, i64>,
        spawned_total: &mut usize,
    ) {
        if !inboxes.contains_key(target) {
            self.spawn_unit(target.clone(), Vec::new(), events_tx.clone(), cancel.clone(), inboxes, handles);
            inflight.insert(target.clone(), 0);
            *spawned_total += 1;
        }
        *inflight.entry(target.clone()).or_insert(0) += 1;
        if let Some(tx) = inboxes.get(target) {
            if tx.send(message).is_err() {
                warn!(?target, "unit task inbox closed before message could be delivered");
            }
        } else {
            warn!(?target, "routing to a unit with no inbox; dropping message");
        }
    }

    fn spawn_unit(
        &self,
        unit: UnitId,
        seed_methods: Vec<G::Method>,
        events_tx: mpsc::UnboundedSender<Event<G, F>>,
        cancel: CancellationToken,
        inboxes: &mut HashMap<UnitId, mpsc::UnboundedSender<IncomingMessage<G, F>>>,
        handles: &mut HashMap<UnitId, JoinHandle<()>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        inboxes.insert(unit.clone(), tx);
        let runner = Runner::new(self.graph.clone(), self.flow.clone(), self.sinks.clone(), unit.clone(), self.resolver.clone());
        let handle = tokio::spawn(run_unit_task(runner, seed_methods, rx, events_tx, cancel));
        handles.insert(unit, handle);
    }
}

/// The body of one unit's task: seed, drain, report idle, then loop on the
/// inbox until cancelled or every sender is dropped.
async fn run_unit_task<G, F, FF, S>(
    mut runner: Runner<G, F, FF, S>,
    seed_methods: Vec<G::Method>,
    mut inbox: mpsc::UnboundedReceiver<IncomingMessage<G, F>>,
    events_tx: mpsc::UnboundedSender<Event<G, F>>,
    cancel: CancellationToken,
) where
    G: ApplicationGraph,
    F: DataflowFact,
    FF: FlowFunctions<G, F>,
    S: SinkOracle<G, F>,
{
    let unit = runner.unit().clone();

    let mut outgoing = runner.seed(&seed_methods);
    outgoing.extend(runner.drain());
    for message in outgoing {
        if events_tx.send(Event::Outgoing { unit: unit.clone(), message }).is_err() {
            return;
        }
    }
    if events_tx.send(Event::Idle { unit: unit.clone() }).is_err() {
        return;
    }

    loop {
        let incoming = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = inbox.recv() => match msg {
                Some(m) => m,
                None => break,
            },
        };

        let mut outgoing = runner.handle_incoming(incoming);
        outgoing.extend(runner.drain());
        let mut closed = false;
        for message in outgoing {
            if events_tx.send(Event::Outgoing { unit: unit.clone(), message }).is_err() {
                closed = true;
                break;
            }
        }
        if closed {
            return;
        }
        if events_tx.send(Event::Idle { unit: unit.clone() }).is_err() {
            return;
        }
    }

    let arena = runner.arena().clone();
    let _ = events_tx.send(Event::Done { unit, arena });
}
