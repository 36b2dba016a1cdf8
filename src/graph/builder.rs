//! Builder pattern for constructing graphs

use std::sync::Arc;

use crate::graph::{
    ConditionalRouter, Edge, GraphError, LoopGuard, Node, NodeFunction, NodeType, RoutingFn,
    StateGraph, END, START,
};
use crate::state::PlanningState;

/// Builder for constructing a StateGraph
pub struct GraphBuilder {
    name: String,
    description: Option<String>,
    nodes: Vec<(String, NodeType, Arc<dyn NodeFunction>)>,
    pending_edges: Vec<PendingEdge>,
    routers: Vec<(String, ConditionalRouter)>,
    entry_point: Option<String>,
    loop_guard: Option<LoopGuard>,
}

/// Represents an edge to be added
struct PendingEdge {
    from: String,
    to: String,
}

impl GraphBuilder {
    /// Create a new graph builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            nodes: Vec::new(),
            pending_edges: Vec::new(),
            routers: Vec::new(),
            entry_point: None,
            loop_guard: None,
        }
    }

    /// Add an executable node
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        node_type: NodeType,
        function: Arc<dyn NodeFunction>,
    ) -> Self {
        self.nodes.push((id.into(), node_type, function));
        self
    }

    /// Add a direct edge between two nodes
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.pending_edges.push(PendingEdge {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Route out of `from` with `router`, which must return one of `targets`
    pub fn add_conditional_edges<F, I, S>(
        mut self,
        from: impl Into<String>,
        condition: impl Into<String>,
        router: F,
        targets: I,
    ) -> Self
    where
        F: Fn(&PlanningState) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let router: RoutingFn = Arc::new(router);
        self.routers.push((
            from.into(),
            ConditionalRouter::new(condition, router, targets.into_iter().map(Into::into).collect()),
        ));
        self
    }

    /// Set the entry point of the graph
    pub fn set_entry_point(mut self, node: impl Into<String>) -> Self {
        self.entry_point = Some(node.into());
        self
    }

    /// Cap the rounds through `node`; once reached, route to `fallback`
    pub fn with_loop_guard(
        mut self,
        node: impl Into<String>,
        max_rounds: usize,
        fallback: impl Into<String>,
    ) -> Self {
        self.loop_guard = Some(LoopGuard::new(node, max_rounds, fallback));
        self
    }

    /// Set graph description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build the graph
    pub fn build(self) -> Result<StateGraph, GraphError> {
        let mut graph = StateGraph::new(self.name);
        graph.metadata.description = self.description;

        graph.add_node(Node {
            id: START.to_string(),
            node_type: NodeType::Start,
        })?;
        graph.add_node(Node {
            id: END.to_string(),
            node_type: NodeType::End,
        })?;

        for (id, node_type, function) in self.nodes {
            graph.add_node(Node {
                id: id.clone(),
                node_type,
            })?;
            graph.set_function(&id, function)?;
        }

        if let Some(entry) = &self.entry_point {
            // Add edge from __start__ to entry point
            graph.add_edge(START, entry, Edge::direct())?;
            graph.set_entry_point(entry)?;
        }

        for pending in self.pending_edges {
            graph.add_edge(&pending.from, &pending.to, Edge::direct())?;
        }

        for (from, router) in self.routers {
            graph.add_router(&from, router)?;
        }

        if let Some(guard) = self.loop_guard {
            graph.set_loop_guard(guard);
        }

        Ok(graph)
    }

    /// Build and validate in one step
    pub fn compile(self) -> Result<super::CompiledGraph, GraphError> {
        self.build()?.compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BasicNode, EdgeType};
    use crate::state::StateUpdate;

    fn step() -> Arc<dyn NodeFunction> {
        Arc::new(BasicNode::new(|_| async { Ok(StateUpdate::Attractions("none".to_string())) }))
    }

    #[test]
    fn test_builder_basic() {
        let graph = GraphBuilder::new("test_graph")
            .with_description("two steps")
            .add_node("node1", NodeType::Tool, step())
            .add_node("node2", NodeType::Tool, step())
            .set_entry_point("node1")
            .add_edge("node1", "node2")
            .add_edge("node2", END)
            .build()
            .unwrap();

        assert!(graph.get_node("node1").is_some());
        assert!(graph.get_node("node2").is_some());
        assert!(graph.get_node(START).is_some());
        assert!(graph.get_node(END).is_some());
        assert_eq!(graph.metadata().description.as_deref(), Some("two steps"));
        assert!(graph.compile().is_ok());
    }

    #[test]
    fn test_builder_conditional_edges() {
        let graph = GraphBuilder::new("test_graph")
            .add_node("decide", NodeType::Agent, step())
            .add_node("left", NodeType::Tool, step())
            .set_entry_point("decide")
            .add_conditional_edges("decide", "pick", |_| "left".to_string(), ["left", END])
            .add_edge("left", END)
            .build()
            .unwrap();

        let edges = graph.get_edges_from("decide");
        assert_eq!(edges.len(), 2);
        assert!(edges
            .iter()
            .all(|(_, edge)| matches!(edge.edge_type, EdgeType::Conditional(_))));

        let compiled = graph.compile().unwrap();
        assert_eq!(
            compiled.next_node("decide", &PlanningState::default()).unwrap(),
            "left"
        );
    }

    #[test]
    fn test_builder_rejects_unknown_edge_target() {
        let err = GraphBuilder::new("test_graph")
            .add_node("node1", NodeType::Tool, step())
            .set_entry_point("node1")
            .add_edge("node1", "ghost")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(ref n) if n == "ghost"));
    }

    #[test]
    fn test_compile_rejects_dead_end() {
        let err = GraphBuilder::new("test_graph")
            .add_node("node1", NodeType::Tool, step())
            .add_node("node2", NodeType::Tool, step())
            .set_entry_point("node1")
            .add_edge("node1", "node2")
            .compile()
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidStructure(_)));
    }

    #[test]
    fn test_loop_guard_must_name_nodes() {
        let err = GraphBuilder::new("test_graph")
            .add_node("node1", NodeType::Tool, step())
            .set_entry_point("node1")
            .add_edge("node1", END)
            .with_loop_guard("tools", 3, "generate")
            .compile()
            .unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(_)));
    }
}
