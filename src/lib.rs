//! # Trip planning workflows on a state graph
//!
//! A travel-itinerary generator built as a small LangGraph-style workflow:
//! weather and attraction lookups, a destination retrieval index and a
//! language model are sequenced by a directed graph whose nodes each
//! contribute one field of a shared [`PlanningState`](state::PlanningState).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tripgraph::config::PlannerConfig;
//! use tripgraph::planner::{PlanRequest, TripPlanner};
//!
//! # async fn example() -> tripgraph::Result<()> {
//! let planner = TripPlanner::from_config(&PlannerConfig::from_env())?;
//!
//! let request = PlanRequest::from_form("Paris", "food, culture");
//! let outcome = planner.run(request.into_state()).await;
//!
//! println!("{}", outcome.display_text());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`graph`]: Workflow graph structures, routers and loop guards
//! - [`engine`]: Execution engine that walks a compiled graph
//! - [`state`]: Planning state and field-scoped updates
//! - [`message`]: Conversation log entries and tool calls
//! - [`tools`]: Weather and attraction lookups exposed as tools
//! - [`llm`]: Chat-completion client abstraction
//! - [`rag`]: Destination dataset index and retrieval
//! - [`planner`]: Workflow shapes and the [`TripPlanner`](planner::TripPlanner) facade

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for planner operations
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Main error type for planner operations
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Graph structure error (missing nodes, dead ends, bad routes)
    #[error("Graph error: {0}")]
    Graph(#[from] graph::GraphError),

    /// Engine execution errors
    #[error("Engine error: {0}")]
    Execution(#[from] engine::ExecutionError),

    /// State merge error
    #[error("State error: {0}")]
    State(#[from] state::StateError),

    /// Tool errors
    #[error("Tool error: {0}")]
    Tool(#[from] tools::ToolError),

    /// Model provider errors
    #[error("LLM error: {0}")]
    Llm(#[from] llm::LlmError),

    /// Destination dataset errors
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] rag::RetrievalError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a run failed, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The model asked for a tool that is not registered
    UnsupportedTool,

    /// The model provider failed or answered unusably
    GenerationFailed,

    /// Caller input was rejected
    InvalidInput,

    /// The workflow graph or its driver is misconfigured
    InvalidWorkflow,

    /// Anything else
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::UnsupportedTool => "unsupported tool requested",
            FailureKind::GenerationFailed => "itinerary generation failed",
            FailureKind::InvalidInput => "invalid input",
            FailureKind::InvalidWorkflow => "invalid workflow",
            FailureKind::Internal => "internal error",
        };
        f.write_str(label)
    }
}

impl PlannerError {
    /// Taxonomy kind of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            PlannerError::Tool(tools::ToolError::UnsupportedTool(_)) => FailureKind::UnsupportedTool,
            PlannerError::Llm(_) => FailureKind::GenerationFailed,
            PlannerError::Tool(tools::ToolError::InvalidParameters { .. })
            | PlannerError::State(state::StateError::InvalidPreferences(_)) => FailureKind::InvalidInput,
            PlannerError::State(state::StateError::ItineraryAlreadySet)
            | PlannerError::Graph(_)
            | PlannerError::Execution(engine::ExecutionError::NodeNotExecutable(_))
            | PlannerError::Execution(engine::ExecutionError::StepLimit(_)) => {
                FailureKind::InvalidWorkflow
            }
            PlannerError::Tool(tools::ToolError::ClientSetup(_))
            | PlannerError::Execution(engine::ExecutionError::Cancelled)
            | PlannerError::Retrieval(_)
            | PlannerError::Serialization(_) => FailureKind::Internal,
        }
    }
}

/// Planner configuration
pub mod config;

/// Core graph module containing graph structures and algorithms
pub mod graph;

/// State management module
pub mod state;

/// Execution engine module
pub mod engine;

/// Conversation messages and tool calls
pub mod message;

/// Tool integration module
pub mod tools;

/// Chat-completion clients
pub mod llm;

/// Destination retrieval
pub mod rag;

/// Planning workflows
pub mod planner;

pub use config::{PlannerConfig, WorkflowShape};
pub use planner::{PlanOutcome, PlanRequest, TripPlanner};
pub use state::{PlanningState, StateUpdate};
