use std::borrow::Cow;

use bt_core::Blackboard;

use super::run_child;
use crate::context::{tags, EvalCx, TickCx};
use crate::node::{Node, NodeCore};
use crate::state::{AbortType, NodeKind, State};

/// Gate: runs the child only while `key` holds a non-null value.
///
/// The key is checked on every tick, so a running child is aborted on the
/// first tick the key is gone whatever the abort type. An abort type that
/// includes *self* only marks that abort with a self-abort trace event. With
/// *lower priority*, a parent selector may jump back to this branch once the
/// key appears.
#[derive(Debug, Clone)]
pub struct BlackboardCondition {
    core: NodeCore,
    key: Cow<'static, str>,
    abort: AbortType,
}

impl BlackboardCondition {
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            core: NodeCore::new(),
            key: key.into(),
            abort: AbortType::None,
        }
    }

    pub fn with_abort(mut self, abort: AbortType) -> Self {
        self.abort = abort;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn abort_type(&self) -> AbortType {
        self.abort
    }

    fn holds(&self, bb: &Blackboard) -> bool {
        bb.has_value(self.key.as_ref())
    }
}

impl Node for BlackboardCondition {
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
    }

    fn on_tick(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        if !self.holds(bb) {
            let child_running = cx.child(0).is_some_and(|c| cx.state_of(c).is_running());
            if self.abort.aborts_self() && child_running {
                cx.emit(tags::SELF_ABORT, 0);
            }
            return State::Failure;
        }
        run_child(cx, bb)
    }

    fn on_stop(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) {
        cx.abort_children(bb);
    }

    fn evaluate(&self, _cx: &EvalCx<'_>, bb: &Blackboard) -> State {
        State::from_bool(self.holds(bb))
    }

    fn can_re_evaluate(&self, _cx: &EvalCx<'_>) -> bool {
        true
    }

    fn enable_hijack(&self) -> bool {
        self.abort.enables_hijack()
    }
}
