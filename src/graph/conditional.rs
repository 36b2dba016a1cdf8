//! Conditional routing and loop guards

use std::fmt;
use std::sync::Arc;

use crate::graph::GraphError;
use crate::state::PlanningState;

/// Routing function that names the next node for a state
pub type RoutingFn = Arc<dyn Fn(&PlanningState) -> String + Send + Sync>;

/// Router attached to one node; picks the next node among a fixed target set
#[derive(Clone)]
pub struct ConditionalRouter {
    /// Condition name, recorded on the generated edges
    pub name: String,

    router: RoutingFn,

    /// Valid target nodes
    valid_targets: Vec<String>,
}

impl ConditionalRouter {
    /// Create a router over `valid_targets`
    pub fn new(name: impl Into<String>, router: RoutingFn, valid_targets: Vec<String>) -> Self {
        Self {
            name: name.into(),
            router,
            valid_targets,
        }
    }

    /// Targets the router is allowed to return
    pub fn valid_targets(&self) -> &[String] {
        &self.valid_targets
    }

    /// Route to next node
    pub fn route(&self, from: &str, state: &PlanningState) -> Result<String, GraphError> {
        let target = (self.router)(state);

        if self.valid_targets.contains(&target) {
            Ok(target)
        } else {
            Err(GraphError::InvalidRoute {
                from: from.to_string(),
                target,
            })
        }
    }
}

impl fmt::Debug for ConditionalRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalRouter")
            .field("name", &self.name)
            .field("valid_targets", &self.valid_targets)
            .finish()
    }
}

/// Hard cap on a loop, enforced by the driver.
///
/// When routing selects `node` and the state's round counter has reached
/// `max_rounds`, the driver goes to `fallback` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopGuard {
    /// Node whose repeated selection is capped
    pub node: String,
    /// Rounds allowed before redirecting
    pub max_rounds: usize,
    /// Node to route to once the cap is hit
    pub fallback: String,
}

impl LoopGuard {
    /// Guard `node` after `max_rounds` rounds
    pub fn new(node: impl Into<String>, max_rounds: usize, fallback: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            max_rounds,
            fallback: fallback.into(),
        }
    }

    /// The fallback node when `target` would exceed the cap, otherwise `None`
    pub fn redirect(&self, target: &str, state: &PlanningState) -> Option<&str> {
        if target == self.node && state.tool_rounds() >= self.max_rounds {
            Some(&self.fallback)
        } else {
            None
        }
    }
}
