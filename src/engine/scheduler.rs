//! Discrete-time propagation scheduler.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::Receiver;
use tracing::{info, trace};

use super::evaluator::evaluate_generation;
use crate::circuit::{Graph, Level, PinId};
use crate::error::{EmuError, Result};

/// Real-time pause between ticks during a continuous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EvalDelay(Duration);

impl EvalDelay {
    /// Back-to-back ticks with no pacing.
    pub const ZERO: EvalDelay = EvalDelay(Duration::ZERO);

    pub fn new(delay: Duration) -> Self {
        Self(delay)
    }

    /// Create a delay from seconds. Negative or non-finite values are rejected.
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        if !secs.is_finite() {
            return Err(EmuError::creation(format!(
                "eval delay must be finite, got {}",
                secs
            )));
        }
        if secs < 0.0 {
            return Err(EmuError::creation(format!(
                "eval delay must not be negative, got {}s",
                secs
            )));
        }
        Duration::try_from_secs_f64(secs)
            .map(Self)
            .map_err(|e| EmuError::unexpected("eval delay out of range", e))
    }

    /// Create a delay from milliseconds. Negative or non-finite values are rejected.
    pub fn from_millis_f64(millis: f64) -> Result<Self> {
        Self::from_secs_f64(millis / 1000.0)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<Duration> for EvalDelay {
    fn from(delay: Duration) -> Self {
        Self(delay)
    }
}

impl fmt::Display for EvalDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Configuration for the scheduler.
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Pause between ticks during a continuous run.
    pub eval_delay: EvalDelay,
    /// Maximum number of ticks a single run may perform.
    pub tick_limit: Option<u64>,
}

impl SchedulerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pause between ticks.
    pub fn with_eval_delay(mut self, eval_delay: EvalDelay) -> Self {
        self.eval_delay = eval_delay;
        self
    }

    /// Stop a run after this many ticks.
    ///
    /// With a zero delay and no limit, a run only ends when cancelled.
    pub fn with_tick_limit(mut self, tick_limit: u64) -> Self {
        self.tick_limit = Some(tick_limit);
        self
    }
}

/// Level of every pin plus the tick counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationState {
    tick: u64,
    levels: Vec<Level>,
}

impl SimulationState {
    /// Tick zero with the graph's declared starting levels.
    pub fn initial(graph: &Graph) -> Self {
        Self {
            tick: 0,
            levels: graph.initial_levels().to_vec(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Levels indexed by [`PinId`].
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, pin: PinId) -> Level {
        self.levels[pin.index()]
    }
}

/// Cooperative cancellation flag shared between a run and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to stop at its next tick boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arm the token for another run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// An ENTRY output pin and the level to drive it to.
pub type EntryInput = (PinId, Level);

/// Why a run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    TickLimit,
}

/// Result of [`Scheduler::run`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// State after the last completed tick
    pub state: SimulationState,
    /// Ticks performed by this run
    pub ticks_run: u64,
    pub stop: StopReason,
}

/// Drives evaluation generations through time.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Advance one tick. Never sleeps.
    pub fn step(&self, graph: &Graph, state: &SimulationState) -> SimulationState {
        let levels = evaluate_generation(graph, &state.levels);
        let tick = state.tick + 1;
        trace!(tick, "evaluated generation");
        SimulationState { tick, levels }
    }

    /// Drive an ENTRY output pin between ticks.
    ///
    /// The pins it feeds are updated immediately; gates see the new level on
    /// the next [`step`](Self::step). The tick counter is unchanged.
    pub fn set_entry_level(
        &self,
        graph: &Graph,
        state: &mut SimulationState,
        pin: PinId,
        level: Level,
    ) {
        state.levels[pin.index()] = level;
        for edge in graph.edges_from(pin) {
            state.levels[edge.to.index()] = level;
        }
    }

    /// Apply every queued ENTRY level without blocking.
    pub fn apply_inputs(
        &self,
        graph: &Graph,
        state: &mut SimulationState,
        inputs: &Receiver<EntryInput>,
    ) {
        for (pin, level) in inputs.try_iter() {
            self.set_entry_level(graph, state, pin, level);
        }
    }

    /// Step repeatedly, waiting the eval delay between ticks.
    ///
    /// `cancel` is only checked at tick boundaries, so a cancellation takes
    /// effect at most one delay later. Levels queued on `inputs` are applied
    /// at each boundary before the next step. `on_tick` sees every completed
    /// state.
    pub fn run<F>(
        &self,
        graph: &Graph,
        mut state: SimulationState,
        cancel: &CancelToken,
        inputs: &Receiver<EntryInput>,
        mut on_tick: F,
    ) -> RunOutcome
    where
        F: FnMut(&SimulationState),
    {
        let delay = self.config.eval_delay.as_duration();
        let limit_reached = |ticks: u64| self.config.tick_limit.map_or(false, |l| ticks >= l);
        let mut ticks_run = 0u64;

        info!(
            from_tick = state.tick,
            delay = ?delay,
            tick_limit = ?self.config.tick_limit,
            "run started"
        );

        let stop = loop {
            if limit_reached(ticks_run) {
                break StopReason::TickLimit;
            }
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            self.apply_inputs(graph, &mut state, inputs);
            state = self.step(graph, &state);
            ticks_run += 1;
            on_tick(&state);

            if !delay.is_zero() && !limit_reached(ticks_run) {
                thread::sleep(delay);
            }
        };

        info!(tick = state.tick, ticks_run, stop = ?stop, "run stopped");

        RunOutcome {
            state,
            ticks_run,
            stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use crossbeam::channel;
    use proptest::prelude::*;

    use super::*;
    use crate::circuit::{NodeDescriptor, NodeKind, ParsedCircuitGraph};

    const NONE: [&str; 0] = [];

    fn no_inputs() -> Receiver<EntryInput> {
        channel::never()
    }

    fn ring_oscillator() -> Graph {
        let parsed = ParsedCircuitGraph::new()
            .node(NodeDescriptor::new("n", NodeKind::Not, ["n_i"], ["n_o"]).with_initial_level(Level::Low))
            .node(NodeDescriptor::new("x", NodeKind::Exit, ["x_i"], NONE))
            .node(
                NodeDescriptor::new("j", NodeKind::Junction, ["j_i"], ["j_o1", "j_o2"])
                    .with_initial_level(Level::Low),
            )
            .edge("n_o", "j_i")
            .edge("j_o1", "n_i")
            .edge("j_o2", "x_i");
        Graph::build(&parsed).unwrap()
    }

    #[test]
    fn test_eval_delay_rejects_negative() {
        assert!(EvalDelay::from_secs_f64(-0.5).is_err());
        assert!(EvalDelay::from_millis_f64(f64::NAN).is_err());
        assert!(EvalDelay::from_millis_f64(0.0).unwrap().is_zero());
        assert_eq!(
            EvalDelay::from_millis_f64(250.0).unwrap().as_duration(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_step_increments_tick() {
        let graph = ring_oscillator();
        let scheduler = Scheduler::default();
        let state = SimulationState::initial(&graph);
        let next = scheduler.step(&graph, &state);
        assert_eq!(state.tick(), 0);
        assert_eq!(next.tick(), 1);
    }

    #[test]
    fn test_oscillation_is_not_an_error() {
        let graph = ring_oscillator();
        let scheduler = Scheduler::default();
        let n_o = graph.find_pin("n_o").unwrap();

        let mut state = SimulationState::initial(&graph);
        let mut seen = Vec::new();
        for _ in 0..6 {
            state = scheduler.step(&graph, &state);
            seen.push(state.level(n_o));
        }
        // n_o(t) = !n_o(t - 2): the junction adds one tick on the way back
        assert_eq!(
            seen,
            vec![Level::High, Level::High, Level::Low, Level::Low, Level::High, Level::High]
        );
    }

    #[test]
    fn test_run_stops_at_tick_limit() {
        let graph = ring_oscillator();
        let scheduler = Scheduler::new(SchedulerConfig::new().with_tick_limit(5));
        let mut observed = Vec::new();
        let outcome = scheduler.run(
            &graph,
            SimulationState::initial(&graph),
            &CancelToken::new(),
            &no_inputs(),
            |s| observed.push(s.tick()),
        );
        assert_eq!(outcome.stop, StopReason::TickLimit);
        assert_eq!(outcome.ticks_run, 5);
        assert_eq!(outcome.state.tick(), 5);
        assert_eq!(observed, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_zero_tick_limit_runs_nothing() {
        let graph = ring_oscillator();
        let scheduler = Scheduler::new(SchedulerConfig::new().with_tick_limit(0));
        let outcome = scheduler.run(
            &graph,
            SimulationState::initial(&graph),
            &CancelToken::new(),
            &no_inputs(),
            |_| {},
        );
        assert_eq!(outcome.ticks_run, 0);
        assert_eq!(outcome.stop, StopReason::TickLimit);
    }

    #[test]
    fn test_cancel_takes_effect_at_tick_boundary() {
        let graph = ring_oscillator();
        let scheduler = Scheduler::default();
        let cancel = CancelToken::new();
        let outcome = scheduler.run(
            &graph,
            SimulationState::initial(&graph),
            &cancel,
            &no_inputs(),
            |s| {
                if s.tick() == 3 {
                    cancel.cancel();
                }
            },
        );
        assert_eq!(outcome.stop, StopReason::Cancelled);
        assert_eq!(outcome.ticks_run, 3);
    }

    #[test]
    fn test_pre_cancelled_run_does_nothing() {
        let graph = ring_oscillator();
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = Scheduler::default().run(
            &graph,
            SimulationState::initial(&graph),
            &cancel,
            &no_inputs(),
            |_| {},
        );
        assert_eq!(outcome.ticks_run, 0);
        assert_eq!(outcome.state.tick(), 0);

        cancel.reset();
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_run_waits_between_ticks() {
        let graph = ring_oscillator();
        let config = SchedulerConfig::new()
            .with_eval_delay(EvalDelay::new(Duration::from_millis(5)))
            .with_tick_limit(3);
        let started = Instant::now();
        let outcome = Scheduler::new(config).run(
            &graph,
            SimulationState::initial(&graph),
            &CancelToken::new(),
            &no_inputs(),
            |_| {},
        );
        assert_eq!(outcome.ticks_run, 3);
        // Two waits: none after the final tick
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_set_entry_level_updates_fan_out() {
        let parsed = ParsedCircuitGraph::new()
            .node(NodeDescriptor::new("a", NodeKind::Entry, NONE, ["a_o"]))
            .node(NodeDescriptor::new("x", NodeKind::Exit, ["x_i"], NONE))
            .node(NodeDescriptor::new("y", NodeKind::Exit, ["y_i"], NONE))
            .edge("a_o", "x_i")
            .edge("a_o", "y_i");
        let graph = Graph::build(&parsed).unwrap();
        let scheduler = Scheduler::default();
        let mut state = SimulationState::initial(&graph);
        let a_o = graph.find_pin("a_o").unwrap();

        scheduler.set_entry_level(&graph, &mut state, a_o, Level::High);
        assert_eq!(state.tick(), 0);
        assert_eq!(state.level(graph.find_pin("x_i").unwrap()), Level::High);
        assert_eq!(state.level(graph.find_pin("y_i").unwrap()), Level::High);
    }

    #[test]
    fn test_queued_inputs_apply_before_next_step() {
        let parsed = ParsedCircuitGraph::new()
            .node(NodeDescriptor::new("a", NodeKind::Entry, NONE, ["a_o"]))
            .node(NodeDescriptor::new("n", NodeKind::Not, ["n_i"], ["n_o"]))
            .node(NodeDescriptor::new("x", NodeKind::Exit, ["x_i"], NONE))
            .edge("a_o", "n_i")
            .edge("n_o", "x_i");
        let graph = Graph::build(&parsed).unwrap();
        let a_o = graph.find_pin("a_o").unwrap();
        let x_i = graph.find_pin("x_i").unwrap();

        let (tx, rx) = channel::unbounded();
        let mut seen = Vec::new();
        let scheduler = Scheduler::new(SchedulerConfig::new().with_tick_limit(4));
        scheduler.run(
            &graph,
            SimulationState::initial(&graph),
            &CancelToken::new(),
            &rx,
            |s| {
                seen.push(s.level(x_i));
                if s.tick() == 1 {
                    tx.send((a_o, Level::High)).unwrap();
                }
                if s.tick() == 2 {
                    tx.send((a_o, Level::Low)).unwrap();
                }
            },
        );
        assert_eq!(
            seen,
            vec![Level::Undefined, Level::Low, Level::High, Level::High]
        );
    }

    proptest! {
        #[test]
        fn runs_are_reproducible(ticks in 1u64..40) {
            let graph = ring_oscillator();
            let scheduler = Scheduler::new(SchedulerConfig::new().with_tick_limit(ticks));
            let run = || {
                let mut trace = Vec::new();
                scheduler.run(
                    &graph,
                    SimulationState::initial(&graph),
                    &CancelToken::new(),
                    &no_inputs(),
                    |s| trace.push(s.clone()),
                );
                trace
            };
            let first = run();
            let second = run();
            prop_assert_eq!(first.len() as u64, ticks);
            prop_assert_eq!(first, second);
        }
    }
}
