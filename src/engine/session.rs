//! Emulation session: the stateful surface handed to a GUI or CLI.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use super::scheduler::{
    CancelToken, EntryInput, EvalDelay, Scheduler, SchedulerConfig, SimulationState, StopReason,
};
use crate::circuit::{Graph, Level, NodeKind, PinId, PinRole};

/// Snapshots a subscriber may leave unread before new ones are dropped.
pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 256;
use crate::error::{EmuError, Result};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Created,
    Running,
    Paused,
    Disposed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Created => "CREATED",
            SessionState::Running => "RUNNING",
            SessionState::Paused => "PAUSED",
            SessionState::Disposed => "DISPOSED",
        };
        write!(f, "{}", name)
    }
}

/// Read model of the current pin levels, keyed by pin id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub tick: u64,
    pub levels: BTreeMap<String, Level>,
}

impl Snapshot {
    fn capture(graph: &Graph, state: &SimulationState) -> Self {
        let levels = graph
            .pins()
            .iter()
            .map(|pin| (pin.name.clone(), state.level(pin.id)))
            .collect();
        Self {
            tick: state.tick(),
            levels,
        }
    }

    /// Level of a pin by id, if the pin exists.
    pub fn level(&self, pin: &str) -> Option<Level> {
        self.levels.get(pin).copied()
    }
}

/// Handle identifying one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Push channel receiving one [`Snapshot`] per completed tick.
///
/// The channel is bounded. While it is full, new snapshots for this
/// subscriber are dropped and the ones already queued are kept.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: Receiver<Snapshot>,
}

struct Subscriber {
    id: SubscriptionId,
    sender: Sender<Snapshot>,
    /// Set while snapshots are being dropped, so the lag is logged once
    lagging: bool,
}

/// Drives ENTRY pins of a session from any thread, including while a
/// continuous [`Session::run`] is in progress.
///
/// Levels are queued and applied at the next tick boundary. Sending never
/// blocks.
#[derive(Debug, Clone)]
pub struct EntryHandle {
    graph: Arc<Graph>,
    sender: Sender<EntryInput>,
}

impl EntryHandle {
    /// Queue a level for an ENTRY output pin.
    pub fn set_entry_level(&self, pin: &str, level: Level) -> Result<()> {
        let pin_id = entry_pin(&self.graph, pin)?;
        self.sender
            .send((pin_id, level))
            .map_err(|_| EmuError::invalid_state("set_entry_level", SessionState::Disposed))
    }
}

/// Resolve a pin id that names an ENTRY output pin.
fn entry_pin(graph: &Graph, pin: &str) -> Result<PinId> {
    let pin_id = graph
        .find_pin(pin)
        .ok_or_else(|| EmuError::invalid_target(pin, "no such pin"))?;
    if graph.pin(pin_id).role != PinRole::Output || graph.owner_kind(pin_id) != NodeKind::Entry {
        return Err(EmuError::invalid_target(
            pin,
            "only ENTRY output pins can be driven",
        ));
    }
    Ok(pin_id)
}

/// Summary of a continuous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks performed by the run
    pub ticks_run: u64,
    /// Tick counter after the run
    pub tick: u64,
    pub stop: StopReason,
}

/// A single emulation of one circuit.
///
/// State machine: `CREATED -> RUNNING <-> PAUSED -> DISPOSED`, with `reset`
/// returning to the initial snapshot from any live state. Every failed
/// command leaves the session exactly as it was.
pub struct Session {
    graph: Arc<Graph>,
    scheduler: Scheduler,
    state: SessionState,
    /// `None` once disposed
    current: Option<SimulationState>,
    stop: CancelToken,
    /// Queue behind every [`EntryHandle`]; `None` once disposed
    inputs: Option<(Sender<EntryInput>, Receiver<EntryInput>)>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
}

impl Session {
    /// Create a session that paces continuous runs with `eval_delay`.
    pub fn create(graph: Arc<Graph>, eval_delay: EvalDelay) -> Result<Self> {
        Self::with_config(graph, SchedulerConfig::new().with_eval_delay(eval_delay))
    }

    /// Create a session with a full scheduler configuration.
    pub fn with_config(graph: Arc<Graph>, config: SchedulerConfig) -> Result<Self> {
        if graph.is_empty() {
            return Err(EmuError::creation("circuit graph is empty"));
        }

        let current = SimulationState::initial(&graph);
        debug!(
            pins = graph.pin_count(),
            delay = %config.eval_delay,
            "session created"
        );

        Ok(Self {
            graph,
            scheduler: Scheduler::new(config),
            state: SessionState::Created,
            current: Some(current),
            stop: CancelToken::new(),
            inputs: Some(channel::unbounded()),
            subscribers: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn config(&self) -> &SchedulerConfig {
        self.scheduler.config()
    }

    /// Token that stops a continuous [`run`](Self::run) at its next tick
    /// boundary. May be tripped from another thread.
    ///
    /// A trip is consumed by the run it stops. Tripping it while no run is in
    /// progress makes the next run return before its first tick.
    pub fn stop_handle(&self) -> CancelToken {
        self.stop.clone()
    }

    /// Handle for driving ENTRY pins from another thread.
    pub fn entry_handle(&self) -> Result<EntryHandle> {
        let (sender, _) = self
            .inputs
            .as_ref()
            .ok_or_else(|| EmuError::invalid_state("entry_handle", self.state))?;
        Ok(EntryHandle {
            graph: Arc::clone(&self.graph),
            sender: sender.clone(),
        })
    }

    fn live(&self, operation: &'static str) -> Result<&SimulationState> {
        self.current
            .as_ref()
            .ok_or_else(|| EmuError::invalid_state(operation, self.state))
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            debug!(from = %self.state, to = %to, "session transition");
            self.state = to;
        }
    }

    /// Drive an ENTRY node's output pin. Takes effect at the next tick.
    pub fn set_entry_level(&mut self, pin: &str, level: Level) -> Result<()> {
        self.live("set_entry_level")?;
        let pin_id = entry_pin(&self.graph, pin)?;
        self.apply_queued_inputs();

        if let Some(current) = self.current.as_mut() {
            self.scheduler
                .set_entry_level(&self.graph, current, pin_id, level);
        }
        debug!(pin, %level, "entry level set");
        Ok(())
    }

    /// Advance exactly one tick. Returns the new tick counter.
    pub fn step(&mut self) -> Result<u64> {
        self.live("step")?;
        self.apply_queued_inputs();
        let next = self.scheduler.step(&self.graph, self.live("step")?);
        let tick = next.tick();
        Self::notify(&mut self.subscribers, &self.graph, &next);
        self.current = Some(next);
        Ok(tick)
    }

    /// Enter `RUNNING` from `CREATED` or `PAUSED`.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Created | SessionState::Paused => {
                self.transition(SessionState::Running);
                Ok(())
            }
            state => Err(EmuError::invalid_state("start", state)),
        }
    }

    /// Leave `RUNNING` for `PAUSED`.
    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            SessionState::Running => {
                self.transition(SessionState::Paused);
                Ok(())
            }
            state => Err(EmuError::invalid_state("pause", state)),
        }
    }

    /// Halt continuous running while keeping every pin level and the tick.
    pub fn stop(&mut self) -> Result<()> {
        self.live("stop")?;
        if self.state == SessionState::Running {
            self.transition(SessionState::Paused);
        }
        Ok(())
    }

    /// Step continuously, pacing ticks by the eval delay, until the stop
    /// handle is tripped or the tick limit is reached. Only valid while
    /// `RUNNING`; the session is `PAUSED` afterwards.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.state != SessionState::Running {
            return Err(EmuError::invalid_state("run", self.state));
        }
        let start = self.live("run")?.clone();

        let graph = &self.graph;
        let subscribers = &mut self.subscribers;
        let outcome = match &self.inputs {
            Some((_, inputs)) => self.scheduler.run(graph, start, &self.stop, inputs, |state| {
                Self::notify(subscribers, graph, state)
            }),
            None => return Err(EmuError::invalid_state("run", self.state)),
        };
        if outcome.stop == StopReason::Cancelled {
            self.stop.reset();
        }

        let summary = RunSummary {
            ticks_run: outcome.ticks_run,
            tick: outcome.state.tick(),
            stop: outcome.stop,
        };
        self.current = Some(outcome.state);
        self.transition(SessionState::Paused);
        Ok(summary)
    }

    /// Restore the initial levels and tick zero, returning to `CREATED`.
    pub fn reset(&mut self) -> Result<()> {
        self.live("reset")?;
        // Levels queued before a reset do not survive it
        if let Some((_, inputs)) = &self.inputs {
            for _ in inputs.try_iter() {}
        }
        self.current = Some(SimulationState::initial(&self.graph));
        self.transition(SessionState::Created);
        Ok(())
    }

    /// Terminal. Releases the simulation state and closes every subscription.
    pub fn dispose(&mut self) -> Result<()> {
        self.live("dispose")?;
        self.current = None;
        self.inputs = None;
        self.subscribers.clear();
        self.transition(SessionState::Disposed);
        Ok(())
    }

    /// Current tick and pin levels. Does not mutate the session.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let current = self.live("snapshot")?;
        Ok(Snapshot::capture(&self.graph, current))
    }

    /// Level of one pin by id.
    pub fn level(&self, pin: &str) -> Result<Level> {
        let current = self.live("level")?;
        let pin_id = self
            .graph
            .find_pin(pin)
            .ok_or_else(|| EmuError::invalid_target(pin, "no such pin"))?;
        Ok(current.level(pin_id))
    }

    /// Current tick counter.
    pub fn tick(&self) -> Result<u64> {
        Ok(self.live("tick")?.tick())
    }

    /// Receive a snapshot after every completed tick, holding up to
    /// [`DEFAULT_SUBSCRIPTION_CAPACITY`] unread snapshots.
    pub fn subscribe(&mut self) -> Result<Subscription> {
        self.subscribe_with_capacity(DEFAULT_SUBSCRIPTION_CAPACITY)
    }

    /// Like [`subscribe`](Self::subscribe) with a chosen queue size. A
    /// capacity of zero is treated as one.
    pub fn subscribe_with_capacity(&mut self, capacity: usize) -> Result<Subscription> {
        self.live("subscribe")?;
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        let (sender, receiver) = channel::bounded(capacity.max(1));
        self.subscribers.push(Subscriber {
            id,
            sender,
            lagging: false,
        });
        Ok(Subscription { id, receiver })
    }

    /// Stop pushing snapshots to a subscriber. Returns whether it was known.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Result<bool> {
        self.live("unsubscribe")?;
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        Ok(self.subscribers.len() != before)
    }

    fn apply_queued_inputs(&mut self) {
        if let (Some(current), Some((_, inputs))) = (self.current.as_mut(), &self.inputs) {
            self.scheduler.apply_inputs(&self.graph, current, inputs);
        }
    }

    fn notify(subscribers: &mut Vec<Subscriber>, graph: &Graph, state: &SimulationState) {
        if subscribers.is_empty() {
            return;
        }
        let snapshot = Snapshot::capture(graph, state);
        subscribers.retain_mut(|sub| match sub.sender.try_send(snapshot.clone()) {
            Ok(()) => {
                sub.lagging = false;
                true
            }
            Err(TrySendError::Full(_)) => {
                if !sub.lagging {
                    warn!(
                        subscription = sub.id.0,
                        tick = snapshot.tick,
                        "subscriber queue full, dropping snapshots"
                    );
                    sub.lagging = true;
                }
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!(subscription = sub.id.0, "subscriber disconnected, dropping it");
                false
            }
        });
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("tick", &self.current.as_ref().map(|s| s.tick()))
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
