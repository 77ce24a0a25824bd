use core::fmt::Debug;

/// Opaque handle for whoever owns a live tree clone.
///
/// The runtime only stores it and derives per-owner seeds from `stable_id`; it
/// never dereferences it.
pub trait OwnerId: Copy + Eq + Debug + Send + 'static {
    fn stable_id(self) -> u64;
}

impl OwnerId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl OwnerId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

impl OwnerId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

/// Unowned trees (tests, tooling).
impl OwnerId for () {
    fn stable_id(self) -> u64 {
        0
    }
}
