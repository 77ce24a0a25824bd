//! Engine-agnostic primitives shared by the behavior tree runtime.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod blackboard;
pub mod owner;
pub mod rng;

pub use blackboard::{BbKey, Blackboard};
pub use owner::OwnerId;
pub use rng::{derive_seed, mix64, DeterministicRng, SplitMix64};
