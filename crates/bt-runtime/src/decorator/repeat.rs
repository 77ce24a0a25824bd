use bt_core::{Blackboard, DeterministicRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{child_reactive, evaluate_child, run_child};
use crate::context::{EvalCx, TickCx};
use crate::node::{Node, NodeCore};
use crate::state::{NodeKind, State};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RepeatMode {
    /// Restart the child forever; the repeat never completes on its own.
    #[default]
    Forever,
    /// Repeat a number of times drawn from `min..=max` on every start.
    Count { min: u32, max: u32 },
}

impl RepeatMode {
    pub fn times(count: u32) -> Self {
        RepeatMode::Count {
            min: count,
            max: count,
        }
    }

    pub fn between(min: u32, max: u32) -> Self {
        RepeatMode::Count { min, max }
    }
}

/// Re-runs its child. Success and failure of the child both count as one
/// completed repetition.
#[derive(Debug, Clone)]
pub struct Repeat {
    core: NodeCore,
    mode: RepeatMode,
    target: u32,
    count: u32,
}

impl Repeat {
    pub fn new(mode: RepeatMode) -> Self {
        Self {
            core: NodeCore::new(),
            mode,
            target: 0,
            count: 0,
        }
    }

    pub fn forever() -> Self {
        Self::new(RepeatMode::Forever)
    }

    pub fn times(count: u32) -> Self {
        Self::new(RepeatMode::times(count))
    }

    pub fn mode(&self) -> RepeatMode {
        self.mode
    }

    /// Repetitions completed since the last start.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Repetitions required for the current run; 0 in forever mode.
    pub fn target(&self) -> u32 {
        self.target
    }
}

impl Node for Repeat {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn on_start(&mut self, cx: &mut TickCx<'_>, _bb: &Blackboard) {
        cx.reset_children();
        self.count = 0;
        self.target = match self.mode {
            RepeatMode::Forever => 0,
            RepeatMode::Count { min, max } => cx.rng().next_range_inclusive(min, max),
        };
    }

    fn on_tick(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        match self.mode {
            RepeatMode::Forever => {
                run_child(cx, bb);
                State::Running
            }
            RepeatMode::Count { .. } => {
                if self.count >= self.target {
                    return State::Success;
                }
                if run_child(cx, bb).is_terminal() {
                    self.count += 1;
                }
                if self.count >= self.target {
                    State::Success
                } else {
                    State::Running
                }
            }
        }
    }

    fn on_stop(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) {
        cx.abort_children(bb);
    }

    fn evaluate(&self, cx: &EvalCx<'_>, bb: &Blackboard) -> State {
        evaluate_child(cx, bb)
    }

    fn can_re_evaluate(&self, cx: &EvalCx<'_>) -> bool {
        child_reactive(cx)
    }

    fn on_reset(&mut self) {
        self.target = 0;
        self.count = 0;
    }
}
