//! The contract between the stack and the steps it runs.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::error::Result;

/// Why a step stopped the stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspendReason {
    /// The random authority could not be reached.
    AwaitingRandom,

    /// A participant has to decide something before the step can finish.
    AwaitingInput(PlayerId),
}

/// What happened when a step ran.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The step finished; anything it pushed is scheduled.
    Done,

    /// The step cannot finish yet. It stays current and is invoked again on
    /// resume; anything it pushed during this attempt is discarded.
    Suspend(SuspendReason),
}

/// A unit of battle work.
///
/// Steps are plain data so a suspended stack can be saved. A step that
/// suspends must record whatever progress it made in its own fields, so
/// re-invoking it never repeats a side effect.
pub trait Step<C>: Sized {
    /// Run the step against `ctx`, scheduling follow-up work on `pusher`.
    fn execute(&mut self, pusher: &mut StepPusher<Self>, ctx: &mut C) -> Result<StepOutcome>;
}

/// Collects the steps a running step schedules.
///
/// Nothing reaches the stack until the step reports [`StepOutcome::Done`].
#[derive(Debug)]
pub struct StepPusher<S> {
    pushed: Vec<S>,
}

impl<S> StepPusher<S> {
    pub(crate) fn new() -> Self {
        Self { pushed: Vec::new() }
    }

    /// Push one step on top. Of several pushes, the last runs first.
    pub fn push(&mut self, step: S) {
        self.pushed.push(step);
    }

    /// Push a sequence so that it runs in the order given, before anything
    /// already pending.
    pub fn push_in_order(&mut self, steps: impl IntoIterator<Item = S>) {
        let mut steps: Vec<S> = steps.into_iter().collect();
        steps.reverse();
        self.pushed.extend(steps);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pushed.is_empty()
    }

    pub(crate) fn into_pushed(self) -> Vec<S> {
        self.pushed
    }
}
