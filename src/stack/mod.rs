//! Execution stack.
//!
//! A battle is a LIFO stack of step descriptors. Running the stack pops the
//! top step and executes it; the step may push sub-steps, which run before
//! anything already pending. A step may also suspend the stack: it then
//! stays in place as the *current* step and is invoked again on resume.
//!
//! ## States
//!
//! ```text
//! Idle ──► Running ──► Completed
//!             │  ▲
//!             ▼  │
//!        Suspended ──► Resumed
//!
//! any non-terminal state ──► Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. Executing, cancelling or
//! saving a terminal stack fails with [`BattleError::StaleBattle`].
//!
//! ## Failures
//!
//! - [`BattleError::RandomUnavailable`] raised by a step suspends the stack
//!   with [`SuspendReason::AwaitingRandom`]; resuming retries the step.
//! - Fatal errors ([`BattleError::is_fatal`]) cancel the stack and are
//!   returned.
//! - Any other error leaves the step current and the stack suspended, and
//!   is returned.
//!
//! ## Example
//!
//! ```
//! use battle_engine::error::Result;
//! use battle_engine::stack::{ExecutionStack, Step, StepOutcome, StepPusher, StackStatus};
//!
//! #[derive(Clone, Debug)]
//! struct Log(&'static str);
//!
//! impl Step<Vec<&'static str>> for Log {
//!     fn execute(&mut self, _: &mut StepPusher<Self>, ran: &mut Vec<&'static str>) -> Result<StepOutcome> {
//!         ran.push(self.0);
//!         Ok(StepOutcome::Done)
//!     }
//! }
//!
//! let mut stack = ExecutionStack::new();
//! stack.push_in_order([Log("a"), Log("b")]).unwrap();
//!
//! let mut ran = Vec::new();
//! assert_eq!(stack.execute(&mut ran).unwrap(), StackStatus::Completed);
//! assert_eq!(ran, vec!["a", "b"]);
//! ```

mod step;

pub use step::{Step, StepOutcome, StepPusher, SuspendReason};

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{BattleError, Result};

/// Lifecycle state of an [`ExecutionStack`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackState {
    Idle,
    Running,
    Suspended,
    Resumed,
    Completed,
    Cancelled,
}

impl StackState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, StackState::Completed | StackState::Cancelled)
    }

    /// Whether the stack may be saved in this state.
    #[must_use]
    pub const fn is_at_rest(self) -> bool {
        matches!(self, StackState::Idle | StackState::Suspended)
    }

    /// Legal transitions of the state machine.
    #[must_use]
    pub const fn can_transition_to(self, next: StackState) -> bool {
        use StackState::*;
        match (self, next) {
            (Completed | Cancelled, _) => false,
            (_, Cancelled) => true,
            (Idle, Running) => true,
            (Running, Suspended | Completed) => true,
            (Suspended, Resumed) => true,
            (Resumed, Running) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for StackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StackState::Idle => "idle",
            StackState::Running => "running",
            StackState::Suspended => "suspended",
            StackState::Resumed => "resumed",
            StackState::Completed => "completed",
            StackState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Where an [`ExecutionStack::execute`] call stopped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackStatus {
    /// Every step ran.
    Completed,

    /// A step is waiting; call `execute` again to resume it.
    Suspended(SuspendReason),
}

/// Persisted form of a stack at rest.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize + Clone",
    deserialize = "S: Deserialize<'de> + Clone"
))]
pub struct StackSnapshot<S: Clone> {
    pub state: StackState,
    pub current: Option<S>,
    pub pending: Vector<S>,
    pub executed: u64,
}

/// LIFO stack of steps for one battle.
///
/// `pending` keeps its top at the back. Cloning is cheap: the pending list
/// is a persistent vector.
#[derive(Clone, Debug)]
pub struct ExecutionStack<S: Clone> {
    state: StackState,
    /// The step that suspended, invoked again before anything pending.
    current: Option<S>,
    pending: Vector<S>,
    /// Steps that reported `Done`.
    executed: u64,
}

impl<S: Clone> Default for ExecutionStack<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> ExecutionStack<S> {
    /// An idle, empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: StackState::Idle,
            current: None,
            pending: Vector::new(),
            executed: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> StackState {
        self.state
    }

    /// Steps that have completed so far.
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// The suspended step, if any.
    #[must_use]
    pub fn current(&self) -> Option<&S> {
        self.current.as_ref()
    }

    /// Mutable access to the suspended step, so input can be fed to it
    /// before resuming. `None` unless the stack is suspended.
    pub fn current_mut(&mut self) -> Option<&mut S> {
        if self.state == StackState::Suspended {
            self.current.as_mut()
        } else {
            None
        }
    }

    /// Steps waiting to run, top first.
    pub fn pending(&self) -> impl Iterator<Item = &S> {
        self.pending.iter().rev()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    /// Push one step on top.
    pub fn push(&mut self, step: S) -> Result<()> {
        self.ensure_live("push onto")?;
        self.pending.push_back(step);
        Ok(())
    }

    /// Push several steps so that they run in the given order.
    pub fn push_in_order(&mut self, steps: impl IntoIterator<Item = S>) -> Result<()> {
        self.ensure_live("push onto")?;
        let mut steps: Vec<S> = steps.into_iter().collect();
        while let Some(step) = steps.pop() {
            self.pending.push_back(step);
        }
        Ok(())
    }

    /// Run steps until the stack empties or a step suspends.
    ///
    /// Starts an idle stack and resumes a suspended one.
    pub fn execute<C>(&mut self, ctx: &mut C) -> Result<StackStatus>
    where
        S: Step<C> + std::fmt::Debug,
    {
        match self.state {
            StackState::Idle => self.transition(StackState::Running)?,
            StackState::Suspended => {
                self.transition(StackState::Resumed)?;
                self.transition(StackState::Running)?;
            }
            StackState::Completed | StackState::Cancelled => {
                return Err(BattleError::StaleBattle(format!(
                    "cannot execute a {} stack",
                    self.state
                )))
            }
            StackState::Running | StackState::Resumed => {
                return Err(BattleError::invariant(format!(
                    "stack re-entered while {}",
                    self.state
                )))
            }
        }

        loop {
            let Some(mut step) = self.current.take().or_else(|| self.pending.pop_back()) else {
                self.transition(StackState::Completed)?;
                debug!(executed = self.executed, "stack completed");
                return Ok(StackStatus::Completed);
            };

            debug!(?step, "executing step");
            let mut pusher = StepPusher::new();
            match step.execute(&mut pusher, ctx) {
                Ok(StepOutcome::Done) => {
                    self.executed += 1;
                    for pushed in pusher.into_pushed() {
                        self.pending.push_back(pushed);
                    }
                }
                Ok(StepOutcome::Suspend(reason)) => {
                    debug!(?step, ?reason, "step suspended");
                    self.current = Some(step);
                    self.transition(StackState::Suspended)?;
                    return Ok(StackStatus::Suspended(reason));
                }
                Err(BattleError::RandomUnavailable(detail)) => {
                    warn!(?step, %detail, "random source unavailable, suspending");
                    self.current = Some(step);
                    self.transition(StackState::Suspended)?;
                    return Ok(StackStatus::Suspended(SuspendReason::AwaitingRandom));
                }
                Err(err) if err.is_fatal() => {
                    error!(?step, %err, "fatal error, cancelling stack");
                    self.discard();
                    return Err(err);
                }
                Err(err) => {
                    self.current = Some(step);
                    self.transition(StackState::Suspended)?;
                    return Err(err);
                }
            }
        }
    }

    /// Discard every pending step. Nothing runs afterwards.
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_live("cancel")?;
        self.discard();
        Ok(())
    }

    /// Capture the stack. Only an idle or suspended stack can be saved.
    pub fn save(&self) -> Result<StackSnapshot<S>> {
        self.ensure_live("save")?;
        if !self.state.is_at_rest() {
            return Err(BattleError::invalid(format!(
                "cannot save a {} stack",
                self.state
            )));
        }
        Ok(StackSnapshot {
            state: self.state,
            current: self.current.clone(),
            pending: self.pending.clone(),
            executed: self.executed,
        })
    }

    /// Rebuild a stack from a snapshot.
    pub fn restore(snapshot: StackSnapshot<S>) -> Result<Self> {
        if !snapshot.state.is_at_rest() {
            return Err(BattleError::invalid(format!(
                "snapshot of a {} stack cannot be restored",
                snapshot.state
            )));
        }
        if snapshot.state == StackState::Idle && snapshot.current.is_some() {
            return Err(BattleError::invalid(
                "idle snapshot carries a suspended step",
            ));
        }
        Ok(Self {
            state: snapshot.state,
            current: snapshot.current,
            pending: snapshot.pending,
            executed: snapshot.executed,
        })
    }

    fn discard(&mut self) {
        self.current = None;
        self.pending.clear();
        self.state = StackState::Cancelled;
    }

    fn ensure_live(&self, action: &str) -> Result<()> {
        if self.state.is_terminal() {
            return Err(BattleError::StaleBattle(format!(
                "cannot {action} a {} stack",
                self.state
            )));
        }
        Ok(())
    }

    fn transition(&mut self, next: StackState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(BattleError::invariant(format!(
                "illegal stack transition {} -> {next}",
                self.state
            )));
        }
        self.state = next;
        Ok(())
    }
}
