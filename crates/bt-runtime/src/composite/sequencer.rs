use bt_core::Blackboard;

use crate::composite::CompositePolicy;
use crate::context::{tags, TickCx};
use crate::state::{AbortType, State};

/// Runs children in order, one step per tick, until one fails (AND).
///
/// A null child is skipped. When a previously satisfied reactive child starts
/// failing, the whole sequence fails before running the current child. Only
/// children that enable hijack themselves are watched; the sequence's own
/// abort type is for its parent.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    cursor: usize,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the child the sequence is on.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn skip_null(&mut self, cx: &TickCx<'_>) {
        let count = cx.child_count();
        while self.cursor < count && cx.child(self.cursor).is_none() {
            self.cursor += 1;
        }
    }
}

impl CompositePolicy for Sequencer {
    fn on_start(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {
        self.cursor = 0;
    }

    fn run_children(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        self.skip_null(cx);
        let Some(child) = cx.child(self.cursor) else {
            return State::Success;
        };

        match cx.run_child(child, bb) {
            State::Running => State::Running,
            State::Success => {
                self.cursor += 1;
                self.skip_null(cx);
                if self.cursor >= cx.child_count() {
                    State::Success
                } else {
                    State::Running
                }
            }
            _ => {
                self.cursor += 1;
                State::Failure
            }
        }
    }

    fn on_lower_priority_evaluate(
        &mut self,
        cx: &mut TickCx<'_>,
        bb: &Blackboard,
        _abort: AbortType,
    ) -> State {
        let last = self.cursor.min(cx.child_count().saturating_sub(1));
        for index in 0..=last {
            let Some(child) = cx.child(index) else {
                continue;
            };
            if !cx.can_re_evaluate_child(child) || !cx.child_enables_hijack(child) {
                continue;
            }
            if cx.evaluate_child(child, bb).is_failure() {
                tracing::debug!(node = %cx.id(), index, "sequence precondition no longer holds");
                cx.emit(tags::LOWER_PRIORITY_ABORT, index as u64);
                return State::Failure;
            }
        }
        State::Success
    }
}
