//! Generic leaves. Game or domain logic lives in user-provided [`Node`]
//! implementations or in the closures handed to [`Condition`] and [`Action`].

use std::fmt;
use std::sync::Arc;

use bt_core::Blackboard;

use crate::context::{EvalCx, TickCx};
use crate::node::{Node, NodeCore};
use crate::state::{AbortType, State};

type Predicate = Arc<dyn Fn(&Blackboard) -> bool + Send + Sync>;
type ActionFn = Arc<dyn Fn(&Blackboard) -> State + Send + Sync>;

/// Reactive leaf: `Success` while the predicate holds.
///
/// Conditions are the nodes composites re-evaluate for conditional abort. The
/// abort type decides whether a parent selector may hijack on its behalf.
#[derive(Clone)]
pub struct Condition {
    core: NodeCore,
    predicate: Predicate,
    abort: AbortType,
}

impl Condition {
    pub fn new(predicate: impl Fn(&Blackboard) -> bool + Send + Sync + 'static) -> Self {
        Self {
            core: NodeCore::new(),
            predicate: Arc::new(predicate),
            abort: AbortType::None,
        }
    }

    pub fn with_abort(mut self, abort: AbortType) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_type(&self) -> AbortType {
        self.abort
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("core", &self.core)
            .field("abort", &self.abort)
            .finish_non_exhaustive()
    }
}

impl Node for Condition {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn on_tick(&mut self, _cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        State::from_bool((self.predicate)(bb))
    }

    fn evaluate(&self, _cx: &EvalCx<'_>, bb: &Blackboard) -> State {
        State::from_bool((self.predicate)(bb))
    }

    fn can_re_evaluate(&self, _cx: &EvalCx<'_>) -> bool {
        true
    }

    fn enable_hijack(&self) -> bool {
        self.abort.enables_hijack()
    }
}

/// Leaf driven by a closure, called once per tick.
///
/// Return `Running` to be ticked again; the closure must not block.
#[derive(Clone)]
pub struct Action {
    core: NodeCore,
    action: ActionFn,
}

impl Action {
    pub fn new(action: impl Fn(&Blackboard) -> State + Send + Sync + 'static) -> Self {
        Self {
            core: NodeCore::new(),
            action: Arc::new(action),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl Node for Action {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn on_tick(&mut self, _cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
        (self.action)(bb)
    }
}

/// `Running` for `ticks` ticks, then `Success`. `Wait::new(0)` and
/// `Wait::new(1)` both succeed on their first tick.
#[derive(Debug, Clone)]
pub struct Wait {
    core: NodeCore,
    ticks: u32,
    elapsed: u32,
}

impl Wait {
    pub fn new(ticks: u32) -> Self {
        Self {
            core: NodeCore::new(),
            ticks,
            elapsed: 0,
        }
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }
}

impl Node for Wait {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn on_start(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {
        self.elapsed = 0;
    }

    fn on_tick(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) -> State {
        self.elapsed = self.elapsed.saturating_add(1);
        if self.elapsed >= self.ticks {
            State::Success
        } else {
            State::Running
        }
    }

    fn on_reset(&mut self) {
        self.elapsed = 0;
    }
}

/// Always reports the same state.
#[derive(Debug, Clone)]
pub struct Constant {
    core: NodeCore,
    state: State,
}

impl Constant {
    pub fn new(state: State) -> Self {
        Self {
            core: NodeCore::new(),
            state,
        }
    }

    pub fn success() -> Self {
        Self::new(State::Success)
    }

    pub fn failure() -> Self {
        Self::new(State::Failure)
    }

    pub fn running() -> Self {
        Self::new(State::Running)
    }
}

impl Node for Constant {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn on_tick(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) -> State {
        self.state
    }
}
