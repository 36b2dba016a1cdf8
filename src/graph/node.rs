//! Node types and step functions

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::state::{PlanningState, StateUpdate};
use crate::Result;

/// Represents a node in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for the node
    pub id: String,

    /// Type of the node
    pub node_type: NodeType,
}

/// Types of nodes supported in the graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeType {
    /// Start node of the graph
    Start,

    /// End node of the graph
    End,

    /// Calls the language model
    Agent,

    /// Calls an external lookup or dispatches tool requests
    Tool,

    /// Reads the destination index
    Retrieval,
}

impl NodeType {
    /// Whether the node carries a step function
    pub fn is_executable(&self) -> bool {
        !matches!(self, NodeType::Start | NodeType::End)
    }
}

/// Boxed async step, for nodes written as closures
pub type NodeFn = Box<
    dyn Fn(PlanningState) -> Pin<Box<dyn Future<Output = Result<StateUpdate>> + Send>>
        + Send
        + Sync,
>;

/// A workflow step.
///
/// Steps read the incoming state and return the update for the field(s)
/// they own. They never mutate the state they are given.
#[async_trait]
pub trait NodeFunction: Send + Sync {
    /// Execute the step against the current state
    async fn execute(&self, state: &PlanningState) -> Result<StateUpdate>;
}

/// Closure-backed node
pub struct BasicNode {
    function: NodeFn,
}

impl BasicNode {
    /// Wrap an async closure over a state snapshot
    pub fn new<F, Fut>(function: F) -> Self
    where
        F: Fn(PlanningState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StateUpdate>> + Send + 'static,
    {
        Self {
            function: Box::new(move |state| Box::pin(function(state))),
        }
    }
}

#[async_trait]
impl NodeFunction for BasicNode {
    async fn execute(&self, state: &PlanningState) -> Result<StateUpdate> {
        (self.function)(state.clone()).await
    }
}
