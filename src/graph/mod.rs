//! Workflow graph structures
//!
//! A workflow is a [`StateGraph`]: a petgraph `DiGraph` of [`Node`]s joined
//! by direct or conditional [`Edge`]s, with one step function per executable
//! node. [`StateGraph::compile`] validates the topology and produces the
//! immutable [`CompiledGraph`] the engine walks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::PlanningState;

pub mod builder;
pub mod conditional;
pub mod edge;
pub mod node;

pub use builder::GraphBuilder;
pub use conditional::{ConditionalRouter, LoopGuard, RoutingFn};
pub use edge::{ConditionalEdge, Edge, EdgeType};
pub use node::{BasicNode, Node, NodeFn, NodeFunction, NodeType};

/// Name of the implicit start node
pub const START: &str = "__start__";

/// Name of the implicit end node
pub const END: &str = "__end__";

/// Errors specific to graph operations
#[derive(Error, Debug)]
pub enum GraphError {
    /// A referenced node was never added
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Two nodes share a name
    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    /// Missing entry point or similar
    #[error("Invalid graph structure: {0}")]
    InvalidStructure(String),

    /// Node unreachable from the entry point
    #[error("Orphaned node: {0}")]
    OrphanedNode(String),

    /// Node added without a step function
    #[error("Node {0} has no step function")]
    MissingNodeFunction(String),

    /// A router returned a target outside its declared set
    #[error("Router at {from} selected unknown target {target}")]
    InvalidRoute {
        /// Node whose router ran
        from: String,
        /// Target it returned
        target: String,
    },
}

/// Metadata associated with a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// Graph name
    pub name: String,

    /// Graph description
    pub description: Option<String>,
}

/// Workflow graph under construction
#[derive(Clone)]
pub struct StateGraph {
    /// The underlying directed graph
    graph: DiGraph<Node, Edge>,

    /// Node name to index mapping
    node_map: HashMap<String, NodeIndex>,

    /// Entry point of the graph
    entry_point: Option<NodeIndex>,

    /// Step functions keyed by node name
    functions: HashMap<String, Arc<dyn NodeFunction>>,

    /// Routers keyed by source node name
    routers: HashMap<String, ConditionalRouter>,

    loop_guard: Option<LoopGuard>,

    metadata: GraphMetadata,
}

impl StateGraph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            entry_point: None,
            functions: HashMap::new(),
            routers: HashMap::new(),
            loop_guard: None,
            metadata: GraphMetadata {
                name: name.into(),
                description: None,
            },
        }
    }

    /// Graph name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Name and description
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    /// Get node by name
    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.node_map
            .get(name)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    /// Get all edges leaving a node, paired with their targets
    pub fn get_edges_from(&self, node_name: &str) -> Vec<(&Node, &Edge)> {
        match self.node_map.get(node_name) {
            Some(&idx) => self
                .graph
                .edges(idx)
                .filter_map(|edge| {
                    self.graph
                        .node_weight(edge.target())
                        .map(|target| (target, edge.weight()))
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> Result<NodeIndex, GraphError> {
        if self.node_map.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let name = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_map.insert(name, idx);
        Ok(idx)
    }

    /// Attach the step function for an existing node
    pub fn set_function(
        &mut self,
        node_name: &str,
        function: Arc<dyn NodeFunction>,
    ) -> Result<(), GraphError> {
        if !self.node_map.contains_key(node_name) {
            return Err(GraphError::NodeNotFound(node_name.to_string()));
        }
        self.functions.insert(node_name.to_string(), function);
        Ok(())
    }

    /// Add an edge between two nodes
    pub fn add_edge(&mut self, from: &str, to: &str, edge: Edge) -> Result<(), GraphError> {
        let from_idx = self
            .node_map
            .get(from)
            .ok_or_else(|| GraphError::NodeNotFound(from.to_string()))?;
        let to_idx = self
            .node_map
            .get(to)
            .ok_or_else(|| GraphError::NodeNotFound(to.to_string()))?;

        self.graph.add_edge(*from_idx, *to_idx, edge);
        Ok(())
    }

    /// Attach a router to `from` and one conditional edge per target
    pub fn add_router(&mut self, from: &str, router: ConditionalRouter) -> Result<(), GraphError> {
        for target in router.valid_targets() {
            self.add_edge(from, target, Edge::conditional(router.name.clone(), target.clone()))?;
        }
        self.routers.insert(from.to_string(), router);
        Ok(())
    }

    /// Set the entry point of the graph
    pub fn set_entry_point(&mut self, node_name: &str) -> Result<(), GraphError> {
        let idx = self
            .node_map
            .get(node_name)
            .ok_or_else(|| GraphError::NodeNotFound(node_name.to_string()))?;
        self.entry_point = Some(*idx);
        Ok(())
    }

    /// Cap how often a node may be re-entered
    pub fn set_loop_guard(&mut self, guard: LoopGuard) {
        self.loop_guard = Some(guard);
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if the graph has cycles
    pub fn has_cycles(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Find executable nodes with no incoming edges
    pub fn find_orphaned_nodes(&self) -> Vec<String> {
        let mut orphaned: Vec<String> = self
            .node_map
            .iter()
            .filter(|(name, _)| name.as_str() != START && name.as_str() != END)
            .filter(|&(_, &idx)| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|(name, _)| name.clone())
            .collect();
        orphaned.sort();
        orphaned
    }

    /// Validate the graph structure
    pub fn validate(&self) -> Result<(), GraphError> {
        let entry = self
            .entry_point
            .ok_or_else(|| GraphError::InvalidStructure("No entry point defined".to_string()))?;

        let (start, end) = match (self.node_map.get(START), self.node_map.get(END)) {
            (Some(&start), Some(&end)) => (start, end),
            _ => {
                return Err(GraphError::InvalidStructure(
                    "Missing __start__ or __end__ node".to_string(),
                ))
            }
        };

        if entry == start || entry == end {
            return Err(GraphError::InvalidStructure(
                "Entry point must be an executable node".to_string(),
            ));
        }

        let orphaned = self.find_orphaned_nodes();
        if !orphaned.is_empty() {
            return Err(GraphError::OrphanedNode(orphaned.join(", ")));
        }

        for (name, &idx) in &self.node_map {
            let node = &self.graph[idx];
            if node.node_type.is_executable() && !self.functions.contains_key(name) {
                return Err(GraphError::MissingNodeFunction(name.clone()));
            }
            if name == END {
                continue;
            }

            let direct = self
                .graph
                .edges(idx)
                .filter(|edge| edge.weight().is_direct())
                .count();
            let routed = self.routers.contains_key(name);

            if direct == 0 && !routed {
                return Err(GraphError::InvalidStructure(format!(
                    "Node {} has no outgoing edge",
                    name
                )));
            }
            if direct > 1 || (direct > 0 && routed) {
                return Err(GraphError::InvalidStructure(format!(
                    "Node {} has ambiguous outgoing edges",
                    name
                )));
            }
        }

        if !has_path_connecting(&self.graph, entry, end, None) {
            return Err(GraphError::InvalidStructure(
                "__end__ is unreachable from the entry point".to_string(),
            ));
        }

        if let Some(guard) = &self.loop_guard {
            for name in [&guard.node, &guard.fallback] {
                if !self.node_map.contains_key(name) {
                    return Err(GraphError::NodeNotFound(name.clone()));
                }
            }
        }

        Ok(())
    }

    /// Compile the graph for execution
    pub fn compile(self) -> Result<CompiledGraph, GraphError> {
        self.validate()?;

        Ok(CompiledGraph {
            graph: Arc::new(self),
        })
    }
}

impl fmt::Debug for StateGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateGraph")
            .field("name", &self.metadata.name)
            .field("nodes", &self.node_count())
            .field("routers", &self.routers)
            .field("loop_guard", &self.loop_guard)
            .finish()
    }
}

/// A validated graph ready for execution
#[derive(Clone, Debug)]
pub struct CompiledGraph {
    graph: Arc<StateGraph>,
}

impl CompiledGraph {
    /// Get the underlying graph
    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    /// Graph name, as given to the builder
    pub fn name(&self) -> &str {
        self.graph.name()
    }

    /// First executable node
    pub fn entry(&self) -> &str {
        // compile() guarantees an entry point
        self.graph
            .entry_point
            .map(|idx| self.graph.graph[idx].id.as_str())
            .unwrap_or(END)
    }

    /// Step function for a node
    pub fn node_function(&self, name: &str) -> Option<&Arc<dyn NodeFunction>> {
        self.graph.functions.get(name)
    }

    /// Loop guard, if the graph has one
    pub fn loop_guard(&self) -> Option<&LoopGuard> {
        self.graph.loop_guard.as_ref()
    }

    /// Resolve the node after `from` for the given state
    pub fn next_node(&self, from: &str, state: &PlanningState) -> Result<String, GraphError> {
        if let Some(router) = self.graph.routers.get(from) {
            return router.route(from, state);
        }

        self.graph
            .get_edges_from(from)
            .into_iter()
            .find(|(_, edge)| edge.is_direct())
            .map(|(target, _)| target.id.clone())
            .ok_or_else(|| GraphError::InvalidStructure(format!("Node {} has no outgoing edge", from)))
    }
}
