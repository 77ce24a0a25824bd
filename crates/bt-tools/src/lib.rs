//! Tooling primitives for inspecting behavior tree execution.
//!
//! Trace events are plain data recorded during ticking so tests and tools can
//! replay what the scheduler did. Structured logging goes through `tracing`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    NullTraceSink, SharedTraceLog, TraceEvent, TraceLog, TraceSink, TracingSink, VecTraceSink,
};
