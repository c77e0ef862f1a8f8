//! Circuit emulation engine.
//!
//! The engine is layered leaf-first:
//!
//! - [`evaluator`] computes one generation of pin levels from the previous
//!   one, a pure single pass over every node
//! - [`scheduler`] turns generations into ticks, paced by an [`EvalDelay`]
//!   and stoppable through a [`CancelToken`]
//! - [`session`] wraps both in a lifecycle (`CREATED`, `RUNNING`, `PAUSED`,
//!   `DISPOSED`) and publishes [`Snapshot`]s
//!
//! ## Timing model
//!
//! Output pins hold the machine state. Wires copy a driving output onto its
//! input pins within the same tick, and every gate contributes exactly one
//! tick of delay. A feedback loop therefore never needs fixpoint iteration;
//! an unstable loop such as a ring of inverters oscillates tick by tick.

pub mod evaluator;
pub mod scheduler;
pub mod session;

pub use evaluator::{evaluate_generation, resolve_wires};
pub use scheduler::{
    CancelToken, EntryInput, EvalDelay, RunOutcome, Scheduler, SchedulerConfig, SimulationState,
    StopReason,
};
pub use session::{
    EntryHandle, RunSummary, Session, SessionState, Snapshot, Subscription, SubscriptionId,
    DEFAULT_SUBSCRIPTION_CAPACITY,
};
