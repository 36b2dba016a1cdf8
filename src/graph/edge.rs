//! Edge types for the workflow graph

use serde::{Deserialize, Serialize};

/// Represents an edge in the graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    /// Type of the edge
    pub edge_type: EdgeType,
}

/// Types of edges supported in the graph
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EdgeType {
    /// Direct edge - always traversed
    Direct,

    /// One branch of a router; traversed when the router picks it
    Conditional(ConditionalEdge),
}

/// A router branch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionalEdge {
    /// Name of the router owning this branch
    pub condition: String,

    /// Target node when the router selects this branch
    pub target: String,
}

impl Edge {
    /// Create a direct edge
    pub fn direct() -> Self {
        Self {
            edge_type: EdgeType::Direct,
        }
    }

    /// Create a conditional edge
    pub fn conditional(condition: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            edge_type: EdgeType::Conditional(ConditionalEdge {
                condition: condition.into(),
                target: target.into(),
            }),
        }
    }

    /// True for unconditional edges
    pub fn is_direct(&self) -> bool {
        self.edge_type == EdgeType::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_edge() {
        let edge = Edge::direct();
        assert_eq!(edge.edge_type, EdgeType::Direct);
        assert!(edge.is_direct());
    }

    #[test]
    fn test_conditional_edge() {
        let edge = Edge::conditional("has_tool_calls", "tools");

        match edge.edge_type {
            EdgeType::Conditional(ref cond) => {
                assert_eq!(cond.condition, "has_tool_calls");
                assert_eq!(cond.target, "tools");
            }
            _ => panic!("Expected conditional edge"),
        }
        assert!(!edge.is_direct());
    }
}
