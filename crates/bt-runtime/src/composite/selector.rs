use bt_core::Blackboard;

use crate::composite::CompositePolicy;
use crate::context::{tags, TickCx};
use crate::state::{AbortType, State};

/// Tries children in priority order, one step per tick, until one succeeds (OR).
///
/// While a lower-priority child runs, higher-priority siblings that enable
/// hijack are re-evaluated every tick. The first one that no longer fails
/// aborts the running child and becomes the current branch.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    cursor: usize,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the branch the selector is on.
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

impl CompositePolicy for Selector {
    fn on_start(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {
        self.cursor = 0;
    }

    fn run_children(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        let count = cx.child_count();
        self.skip_null(cx);
        let Some(child) = cx.child(self.cursor) else {
            return State::Failure;
        };

        match cx.run_child(child, bb) {
            State::Running => State::Running,
            State::Success => State::Success,
            _ => {
                self.cursor += 1;
                self.skip_null(cx);
                if self.cursor >= count {
                    State::Failure
                } else {
                    State::Running
                }
            }
        }
    }

    fn on_lower_priority_evaluate(
        &mut self,
        cx: &mut TickCx<'_>,
        bb: &Blackboard,
        _abort: AbortType,
    ) -> State {
        let end = self.cursor.min(cx.child_count());
        for index in 0..end {
            let Some(sibling) = cx.child(index) else {
                continue;
            };
            if !cx.child_enables_hijack(sibling) || !cx.can_re_evaluate_child(sibling) {
                continue;
            }
            if cx.evaluate_child(sibling, bb).is_failure() {
                continue;
            }

            if let Some(running) = cx.child(self.cursor) {
                cx.abort_child(running, bb);
            }
            tracing::debug!(
                node = %cx.id(),
                from = self.cursor,
                to = index,
                "higher-priority branch hijacked the selector"
            );
            cx.emit(tags::HIJACK, index as u64);
            self.cursor = index;
            break;
        }
        State::Success
    }
}
