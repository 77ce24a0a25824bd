//! Node states and abort policies.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Execution state of a node.
///
/// `NotEntered` is the idle state of a node its parent has not (re)started
/// yet. Failure is an ordinary outcome, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum State {
    #[default]
    NotEntered,
    Running,
    Success,
    Failure,
}

impl State {
    /// `Success` or `Failure`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Success | State::Failure)
    }

    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, State::Running)
    }

    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, State::Success)
    }

    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, State::Failure)
    }

    pub fn from_bool(success: bool) -> Self {
        if success {
            State::Success
        } else {
            State::Failure
        }
    }

    /// Stable numeric code used in trace payloads.
    pub fn code(self) -> u64 {
        match self {
            State::NotEntered => 0,
            State::Running => 1,
            State::Success => 2,
            State::Failure => 3,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::NotEntered => "not-entered",
            State::Running => "running",
            State::Success => "success",
            State::Failure => "failure",
        })
    }
}

/// Which conditional aborts a node takes part in.
///
/// - `SelfOnly`: the node re-evaluates itself every tick and fails its own
///   branch when the evaluation fails.
/// - `LowerPriority`: the node may hijack control from lower-priority siblings
///   when it becomes viable again.
/// - `Both`: both of the above.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AbortType {
    #[default]
    None,
    #[cfg_attr(feature = "serde", serde(rename = "self"))]
    SelfOnly,
    LowerPriority,
    Both,
}

impl AbortType {
    pub fn aborts_self(self) -> bool {
        matches!(self, AbortType::SelfOnly | AbortType::Both)
    }

    pub fn enables_hijack(self) -> bool {
        matches!(self, AbortType::LowerPriority | AbortType::Both)
    }
}

/// Node family, used for arity validation and pool capacities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NodeKind {
    Leaf,
    Composite,
    Decorator,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Leaf => "leaf",
            NodeKind::Composite => "composite",
            NodeKind::Decorator => "decorator",
        })
    }
}
