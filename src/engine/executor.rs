//! Graph execution engine implementation

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::graph::{CompiledGraph, GraphError, END};
use crate::state::PlanningState;
use crate::{PlannerError, Result};

/// Default bound on node executions per run
pub const DEFAULT_MAX_STEPS: usize = 100;

/// Default number of finished runs kept in [`ExecutionEngine::history`]
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Errors specific to execution
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The node exists but has no step function attached
    #[error("Node {0} has no step function")]
    NodeNotExecutable(String),

    /// Too many nodes ran without reaching `__end__`
    #[error("Step limit of {0} reached before __end__")]
    StepLimit(usize),

    /// The streaming consumer went away
    #[error("Execution cancelled: event receiver dropped")]
    Cancelled,
}

/// Status of an execution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Execution is running
    Running,

    /// Execution reached `__end__`
    Completed,

    /// Execution stopped on an error
    Failed,
}

/// Metadata about an execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Unique id, `exec-<uuid>`
    pub execution_id: String,

    /// Graph that was executed
    pub graph: String,

    /// When the run began
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub ended_at: Option<DateTime<Utc>>,

    /// Nodes in the order they ran
    pub path: Vec<String>,

    /// Times the loop guard overrode routing
    pub forced_fallbacks: usize,

    /// Final status
    pub status: ExecutionStatus,

    /// Node that failed, if any
    pub failed_node: Option<String>,

    /// Error message if failed
    pub error: Option<String>,
}

impl ExecutionMetadata {
    fn start(graph: &str) -> Self {
        Self {
            execution_id: generate_execution_id(),
            graph: graph.to_string(),
            started_at: Utc::now(),
            ended_at: None,
            path: Vec::new(),
            forced_fallbacks: 0,
            status: ExecutionStatus::Running,
            failed_node: None,
            error: None,
        }
    }

    /// Total nodes executed
    pub fn nodes_executed(&self) -> usize {
        self.path.len()
    }
}

/// Result of one run: the last consistent state, plus the failure if any
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// Last consistent state
    pub state: PlanningState,
    /// Failure cause, if any
    pub error: Option<PlannerError>,
    /// Path, timings and status
    pub metadata: ExecutionMetadata,
}

impl ExecutionOutcome {
    /// True when no error was recorded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Emitted after every node while streaming
#[derive(Debug, Clone)]
pub struct StepEvent {
    /// Node that just ran
    pub node: String,

    /// Node that runs next (`__end__` on the last step)
    pub next: String,

    /// Kind of update the node produced
    pub update: &'static str,

    /// State after the node's update was merged
    pub state: PlanningState,
}

/// Main execution engine for running graphs
#[derive(Clone)]
pub struct ExecutionEngine {
    max_steps: usize,

    history_limit: usize,

    /// Most recent executions, oldest at the front
    history: Arc<RwLock<VecDeque<ExecutionMetadata>>>,
}

impl ExecutionEngine {
    /// Create a new execution engine
    pub fn new() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            history: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    /// Bound on node executions per run
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Keep at most `limit` finished runs; zero disables the history
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Metadata of the most recent finished executions, oldest first
    pub fn history(&self) -> Vec<ExecutionMetadata> {
        self.history.read().iter().cloned().collect()
    }

    fn record(&self, metadata: ExecutionMetadata) {
        if self.history_limit == 0 {
            return;
        }
        let mut history = self.history.write();
        while history.len() >= self.history_limit {
            history.pop_front();
        }
        history.push_back(metadata);
    }

    /// Execute a compiled graph to completion
    pub async fn execute(&self, graph: &CompiledGraph, input: PlanningState) -> ExecutionOutcome {
        self.run(graph, input, None).await
    }

    /// Execute a compiled graph, yielding a [`StepEvent`] after every node.
    ///
    /// A failed run ends the stream with its error.
    pub fn stream(
        &self,
        graph: Arc<CompiledGraph>,
        input: PlanningState,
    ) -> ReceiverStream<Result<StepEvent>> {
        let (tx, rx) = mpsc::channel(100);
        let engine = self.clone();

        tokio::spawn(async move {
            let outcome = engine.run(&graph, input, Some(&tx)).await;
            if let Some(error) = outcome.error {
                if !matches!(error, PlannerError::Execution(ExecutionError::Cancelled)) {
                    let _ = tx.send(Err(error)).await;
                }
            }
        });

        ReceiverStream::new(rx)
    }

    async fn run(
        &self,
        graph: &CompiledGraph,
        input: PlanningState,
        events: Option<&mpsc::Sender<Result<StepEvent>>>,
    ) -> ExecutionOutcome {
        let mut metadata = ExecutionMetadata::start(graph.name());
        let span = info_span!(
            "workflow",
            graph = %graph.name(),
            execution_id = %metadata.execution_id
        );

        let mut state = input;
        let result = self
            .drive(graph, &mut state, &mut metadata, events)
            .instrument(span)
            .await;

        metadata.ended_at = Some(Utc::now());
        let error = match result {
            Ok(()) => {
                metadata.status = ExecutionStatus::Completed;
                info!(
                    execution_id = %metadata.execution_id,
                    nodes = metadata.nodes_executed(),
                    "workflow completed"
                );
                None
            }
            Err(e) => {
                metadata.status = ExecutionStatus::Failed;
                metadata.error = Some(e.to_string());
                error!(
                    execution_id = %metadata.execution_id,
                    node = metadata.failed_node.as_deref().unwrap_or("-"),
                    error = %e,
                    "workflow failed"
                );
                Some(e)
            }
        };

        self.record(metadata.clone());

        ExecutionOutcome {
            state,
            error,
            metadata,
        }
    }

    /// Walk the graph from its entry point to `__end__`.
    ///
    /// `state` only ever receives complete updates, so on error it holds
    /// the last consistent state.
    async fn drive(
        &self,
        graph: &CompiledGraph,
        state: &mut PlanningState,
        metadata: &mut ExecutionMetadata,
        events: Option<&mpsc::Sender<Result<StepEvent>>>,
    ) -> Result<()> {
        let mut current = graph.entry().to_string();

        while current != END {
            if metadata.path.len() >= self.max_steps {
                metadata.failed_node = Some(current.clone());
                return Err(ExecutionError::StepLimit(self.max_steps).into());
            }

            let function = graph
                .node_function(&current)
                .ok_or_else(|| ExecutionError::NodeNotExecutable(current.clone()))?;

            debug!(node = %current, step = metadata.path.len() + 1, "executing node");
            metadata.path.push(current.clone());

            let update = match function.execute(state).await {
                Ok(update) => update,
                Err(e) => {
                    metadata.failed_node = Some(current.clone());
                    return Err(e);
                }
            };
            let kind = update.kind();
            state.apply(update).map_err(|e| {
                metadata.failed_node = Some(current.clone());
                PlannerError::from(e)
            })?;

            let mut next = graph.next_node(&current, state).map_err(|e: GraphError| {
                metadata.failed_node = Some(current.clone());
                PlannerError::from(e)
            })?;

            if let Some(guard) = graph.loop_guard() {
                if let Some(fallback) = guard.redirect(&next, state) {
                    warn!(
                        node = %current,
                        blocked = %next,
                        fallback = %fallback,
                        rounds = state.tool_rounds(),
                        max_rounds = guard.max_rounds,
                        "loop cap reached, forcing fallback"
                    );
                    metadata.forced_fallbacks += 1;
                    next = fallback.to_string();
                }
            }

            debug!(node = %current, update = kind, next = %next, "node completed");

            if let Some(tx) = events {
                let event = StepEvent {
                    node: current.clone(),
                    next: next.clone(),
                    update: kind,
                    state: state.clone(),
                };
                if tx.send(Ok(event)).await.is_err() {
                    return Err(ExecutionError::Cancelled.into());
                }
            }

            current = next;
        }

        Ok(())
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a unique execution ID
fn generate_execution_id() -> String {
    format!("exec-{}", uuid::Uuid::new_v4())
}
