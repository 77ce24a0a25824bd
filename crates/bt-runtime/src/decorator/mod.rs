//! Single-child wrappers.
//!
//! A decorator owns exactly one child slot (checked when the tree is
//! validated). A null child makes the decorator fail instead of panicking.

mod condition;
mod repeat;
mod scope;

pub use condition::BlackboardCondition;
pub use repeat::{Repeat, RepeatMode};
pub use scope::BlackboardScope;

use bt_core::Blackboard;

use crate::context::{EvalCx, TickCx};
use crate::state::State;

fn run_child(cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
    match cx.child(0) {
        Some(child) => cx.run_child(child, bb),
        None => State::Failure,
    }
}

/// Child evaluation if the child is reactive, otherwise `Success`.
fn evaluate_child(cx: &EvalCx<'_>, bb: &Blackboard) -> State {
    match cx.child(0) {
        Some(child) if cx.can_re_evaluate_child(child) => cx.evaluate_child(child, bb),
        _ => State::Success,
    }
}

fn child_reactive(cx: &EvalCx<'_>) -> bool {
    cx.child(0).is_some_and(|child| cx.can_re_evaluate_child(child))
}
