//! Composite nodes: an ordered child list plus an abort policy.
//!
//! [`Composite`] owns the shared dispatch; the concrete behavior comes from a
//! [`CompositePolicy`]. Each tick a composite
//!
//! 1. fails immediately if its abort type includes *self* and its own
//!    evaluation fails,
//! 2. runs the policy's lower-priority check (hijack), which may fail it, and
//! 3. hands control to [`CompositePolicy::run_children`].
//!
//! Child order is priority order: index 0 first. It is fixed at authoring time
//! and never rearranged while ticking.

mod parallel;
mod probability;
mod selector;
mod sequencer;

pub use parallel::{Parallel, ParallelMode, SimpleParallel};
pub use probability::ProbabilityBranch;
pub use selector::Selector;
pub use sequencer::Sequencer;

use bt_core::Blackboard;

use crate::context::{tags, EvalCx, TickCx};
use crate::node::{Node, NodeCore};
use crate::state::{AbortType, NodeKind, State};

pub trait CompositePolicy: Clone + Send + Sync + 'static {
    /// Called from the composite's `on_start`, after children were reset.
    fn on_start(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {}

    fn run_children(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State;

    /// Hijack check. Returning `Failure` fails the composite before
    /// `run_children`. `abort` is the composite's own abort type.
    fn on_lower_priority_evaluate(
        &mut self,
        _cx: &mut TickCx<'_>,
        _bb: &Blackboard,
        _abort: AbortType,
    ) -> State {
        State::Success
    }

    /// Evaluation while the composite is started.
    fn on_active_evaluate(&self, cx: &EvalCx<'_>, bb: &Blackboard) -> State {
        evaluate_reactive_children(cx, bb)
    }

    /// Evaluation while the composite is idle.
    fn on_deactive_evaluate(&self, cx: &EvalCx<'_>, bb: &Blackboard) -> State {
        evaluate_reactive_children(cx, bb)
    }

    fn can_re_evaluate(&self, cx: &EvalCx<'_>) -> bool {
        any_child_reactive(cx)
    }

    fn sync_children(&mut self, _count: usize) {}

    fn on_reset(&mut self) {}
}

/// `Failure` if any child that can re-evaluate now evaluates to `Failure`.
pub fn evaluate_reactive_children(cx: &EvalCx<'_>, bb: &Blackboard) -> State {
    for child in cx.children() {
        if cx.can_re_evaluate_child(child) && cx.evaluate_child(child, bb).is_failure() {
            return State::Failure;
        }
    }
    State::Success
}

pub fn any_child_reactive(cx: &EvalCx<'_>) -> bool {
    cx.children().any(|child| cx.can_re_evaluate_child(child))
}

#[derive(Debug, Clone)]
pub struct Composite<P> {
    core: NodeCore,
    abort: AbortType,
    policy: P,
}

impl<P: CompositePolicy> Composite<P> {
    pub fn new(policy: P) -> Self {
        Self {
            core: NodeCore::new(),
            abort: AbortType::None,
            policy,
        }
    }

    pub fn with_abort(mut self, abort: AbortType) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_type(&self) -> AbortType {
        self.abort
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }
}

impl<P: CompositePolicy> Node for Composite<P> {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn on_start(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) {
        cx.reset_children();
        self.policy.on_start(cx, bb);
    }

    fn on_tick(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        if self.abort.aborts_self() && self.evaluate(&cx.probe(), bb).is_failure() {
            tracing::debug!(node = %cx.id(), "composite failed its own re-evaluation");
            cx.emit(tags::SELF_ABORT, 0);
            return State::Failure;
        }
        if self
            .policy
            .on_lower_priority_evaluate(cx, bb, self.abort)
            .is_failure()
        {
            return State::Failure;
        }
        self.policy.run_children(cx, bb)
    }

    fn on_stop(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) {
        cx.abort_children(bb);
    }

    fn evaluate(&self, cx: &EvalCx<'_>, bb: &Blackboard) -> State {
        if self.core.started() {
            self.policy.on_active_evaluate(cx, bb)
        } else {
            self.policy.on_deactive_evaluate(cx, bb)
        }
    }

    fn can_re_evaluate(&self, cx: &EvalCx<'_>) -> bool {
        self.policy.can_re_evaluate(cx)
    }

    fn enable_hijack(&self) -> bool {
        self.abort.enables_hijack()
    }

    fn sync_children(&mut self, count: usize) {
        self.policy.sync_children(count);
    }

    fn on_reset(&mut self) {
        self.policy.on_reset();
    }
}
