use std::fmt;

use bt_core::Blackboard;

use super::{child_reactive, evaluate_child, run_child};
use crate::context::{EvalCx, TickCx};
use crate::node::{Node, NodeCore};
use crate::state::{NodeKind, State};

/// Runs its child against a fresh blackboard layered over the incoming one.
///
/// The scoped blackboard is created on start and cleared on stop. Reads fall
/// back to the parent; writes stay local, so the parent is never modified
/// through the scope.
pub struct BlackboardScope {
    core: NodeCore,
    scope: Option<Blackboard>,
}

impl BlackboardScope {
    pub fn new() -> Self {
        Self {
            core: NodeCore::new(),
            scope: None,
        }
    }

    /// The live scoped blackboard, present between start and stop.
    pub fn scope(&self) -> Option<&Blackboard> {
        self.scope.as_ref()
    }
}

impl Default for BlackboardScope {
    fn default() -> Self {
        Self::new()
    }
}

// A clone never shares the live scope with its source.
impl Clone for BlackboardScope {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            scope: None,
        }
    }
}

impl fmt::Debug for BlackboardScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlackboardScope")
            .field("core", &self.core)
            .field("active", &self.scope.is_some())
            .finish()
    }
}

impl Node for BlackboardScope {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Decorator
    }

    fn on_start(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) {
        cx.reset_children();
        self.scope = Some(Blackboard::with_parent(bb));
    }

    fn on_tick(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        let scope = self
            .scope
            .get_or_insert_with(|| Blackboard::with_parent(bb));
        run_child(cx, scope)
    }

    fn on_stop(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) {
        match self.scope.take() {
            Some(scope) => {
                cx.abort_children(&scope);
                scope.clear();
            }
            None => cx.abort_children(bb),
        }
    }

    fn evaluate(&self, cx: &EvalCx<'_>, bb: &Blackboard) -> State {
        evaluate_child(cx, self.scope.as_ref().unwrap_or(bb))
    }

    fn can_re_evaluate(&self, cx: &EvalCx<'_>) -> bool {
        child_reactive(cx)
    }

    fn on_reset(&mut self) {
        self.scope = None;
    }
}
