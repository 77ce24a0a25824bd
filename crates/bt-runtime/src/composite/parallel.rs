use bt_core::Blackboard;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::composite::CompositePolicy;
use crate::context::{tags, TickCx};
use crate::state::{AbortType, State};

/// When a [`Parallel`] reports completion.
///
/// Every mode reports `Success` on completion. `UntilAnyFailure` in particular
/// turns "a child failed" into overall success; trees authored against that
/// behavior depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ParallelMode {
    /// Never completes on its own; the parent has to stop it.
    #[default]
    Continuous,
    /// `Success` once any child succeeds or fails.
    UntilAnyComplete,
    /// `Success` once any child fails.
    UntilAnyFailure,
    /// `Success` once any child succeeds.
    UntilAnySuccess,
}

/// Ticks every child on every tick, interleaved in priority order.
#[derive(Debug, Clone, Default)]
pub struct Parallel {
    mode: ParallelMode,
}

impl Parallel {
    pub fn new(mode: ParallelMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ParallelMode {
        self.mode
    }
}

impl CompositePolicy for Parallel {
    fn run_children(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        let mut any_success = false;
        let mut any_failure = false;
        for index in 0..cx.child_count() {
            let Some(child) = cx.child(index) else {
                continue;
            };
            match cx.run_child(child, bb) {
                State::Success => any_success = true,
                State::Failure => any_failure = true,
                _ => {}
            }
        }

        let done = match self.mode {
            ParallelMode::Continuous => false,
            ParallelMode::UntilAnyComplete => any_success || any_failure,
            ParallelMode::UntilAnyFailure => any_failure,
            ParallelMode::UntilAnySuccess => any_success,
        };
        if done {
            State::Success
        } else {
            State::Running
        }
    }

    fn on_lower_priority_evaluate(
        &mut self,
        cx: &mut TickCx<'_>,
        bb: &Blackboard,
        _abort: AbortType,
    ) -> State {
        for index in 0..cx.child_count() {
            let Some(child) = cx.child(index) else {
                continue;
            };
            if cx.can_re_evaluate_child(child) && cx.evaluate_child(child, bb).is_failure() {
                tracing::debug!(node = %cx.id(), index, "parallel child failed re-evaluation");
                cx.emit(tags::LOWER_PRIORITY_ABORT, index as u64);
                return State::Failure;
            }
        }
        State::Success
    }
}

/// Fire-and-forget fan-out: ticks every child once and always succeeds.
#[derive(Debug, Clone, Default)]
pub struct SimpleParallel;

impl SimpleParallel {
    pub fn new() -> Self {
        Self
    }
}

impl CompositePolicy for SimpleParallel {
    fn run_children(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        for index in 0..cx.child_count() {
            if let Some(child) = cx.child(index) {
                cx.run_child(child, bb);
            }
        }
        State::Success
    }
}
