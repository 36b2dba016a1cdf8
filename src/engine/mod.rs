//! Graph execution engine
//!
//! Drives a [`CompiledGraph`](crate::graph::CompiledGraph) from its entry
//! point to `__end__`, merging each node's update into the state and
//! applying the graph's loop guard.

pub mod executor;

pub use executor::{
    ExecutionEngine, ExecutionError, ExecutionMetadata, ExecutionOutcome, ExecutionStatus,
    StepEvent, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_STEPS,
};
