//! Trip planning workflows
//!
//! [`TripPlanner`] wires the lookups, the destination index and the model
//! into one of three graph shapes and runs it on the [`ExecutionEngine`].
//!
//! * [`WorkflowShape::Pipeline`]: weather, attractions and destination
//!   info are gathered in a fixed order, then one contextual generation.
//! * [`WorkflowShape::ToolLoop`]: the model decides which lookups to call;
//!   a loop guard forces generation after a fixed number of tool rounds.
//! * [`WorkflowShape::SingleShot`]: one day-wise generation from
//!   [`TripPreferences`].

use std::sync::Arc;

use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::config::{PlannerConfig, WorkflowShape};
use crate::engine::{ExecutionEngine, ExecutionMetadata, ExecutionOutcome, StepEvent};
use crate::graph::CompiledGraph;
use crate::llm::{HttpLlmClient, LlmClient};
use crate::message::Message;
use crate::rag::{self, DestinationRetriever, DocumentIndex, HashingEmbedder};
use crate::state::{PlanningState, TripPreferences};
use crate::tools::{AttractionLookup, OpenWeatherClient, StaticAttractions, ToolRegistry, WeatherLookup};
use crate::{FailureKind, PlannerError, Result};

pub mod generator;
pub mod nodes;
pub mod workflows;

pub use generator::{ItineraryGenerator, PromptStyle};
pub use nodes::route_after_planner;
pub use workflows::{pipeline_graph, single_shot_graph, tool_loop_graph};

/// Shown in place of an itinerary when a run fails
pub const FAILURE_MESSAGE: &str = "Trip planning failed. Please try again.";

/// External collaborators a planner is built from
#[derive(Clone)]
pub struct PlannerComponents {
    /// Chat-completion provider
    pub llm: Arc<dyn LlmClient>,
    /// Current-conditions lookup
    pub weather: Arc<dyn WeatherLookup>,
    /// Highlights lookup
    pub attractions: Arc<dyn AttractionLookup>,
    /// Destination index for retrieval
    pub index: Arc<DocumentIndex>,
}

impl PlannerComponents {
    /// Production collaborators: HTTP model and weather clients, the
    /// templated attraction list, and the process-wide destination index
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        let llm = HttpLlmClient::new(config.llm.clone())?;
        let weather = OpenWeatherClient::new(config.weather.clone())?;
        let index = rag::init_global_index(
            &config.retrieval.dataset_path,
            Arc::new(HashingEmbedder::new(config.retrieval.dimensions)),
        );

        Ok(Self {
            llm: Arc::new(llm),
            weather: Arc::new(weather),
            attractions: Arc::new(StaticAttractions::default()),
            index,
        })
    }
}

/// Runs planning requests against one compiled workflow
#[derive(Clone)]
pub struct TripPlanner {
    shape: WorkflowShape,
    graph: Arc<CompiledGraph>,
    engine: ExecutionEngine,
}

impl TripPlanner {
    /// Build the workflow selected by `config.workflow.shape`
    pub fn new(config: &PlannerConfig, components: PlannerComponents) -> Result<Self> {
        let generator = Arc::new(ItineraryGenerator::new(components.llm.clone(), &config.llm));
        let shape = config.workflow.shape;

        let graph = match shape {
            WorkflowShape::Pipeline => pipeline_graph(
                components.weather,
                components.attractions,
                DestinationRetriever::new(components.index).with_top_k(config.retrieval.top_k),
                generator,
            )?,
            WorkflowShape::ToolLoop => tool_loop_graph(
                components.llm,
                ToolRegistry::with_lookups(components.weather, components.attractions),
                generator,
                config.llm.temperature,
                config.workflow.max_tool_rounds,
            )?,
            WorkflowShape::SingleShot => single_shot_graph(generator)?,
        };

        let max_steps = match shape {
            // Every tool round costs a planner and a tools step, plus the
            // final planner turn and generation
            WorkflowShape::ToolLoop => config
                .workflow
                .max_steps
                .max(config.workflow.max_tool_rounds.saturating_mul(2).saturating_add(2)),
            WorkflowShape::Pipeline | WorkflowShape::SingleShot => config.workflow.max_steps,
        };

        info!(shape = ?shape, graph = %graph.name(), max_steps, "trip planner ready");

        Ok(Self {
            shape,
            graph: Arc::new(graph),
            engine: ExecutionEngine::new().with_max_steps(max_steps),
        })
    }

    /// Build with production collaborators
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        Self::new(config, PlannerComponents::from_config(config)?)
    }

    /// Workflow this planner runs
    pub fn shape(&self) -> WorkflowShape {
        self.shape
    }

    /// The compiled workflow
    pub fn graph(&self) -> &CompiledGraph {
        &self.graph
    }

    /// Engine, including run history
    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    /// Run one request to completion
    pub async fn run(&self, state: PlanningState) -> PlanOutcome {
        let state = self.prepare(state);
        self.engine.execute(&self.graph, state).await.into()
    }

    /// Run one request, yielding the state after every step
    pub fn stream(&self, state: PlanningState) -> ReceiverStream<Result<StepEvent>> {
        let state = self.prepare(state);
        self.engine.stream(Arc::clone(&self.graph), state)
    }

    /// The tool loop needs a user turn for the model to answer
    fn prepare(&self, state: PlanningState) -> PlanningState {
        if self.shape == WorkflowShape::ToolLoop && state.messages().is_empty() {
            let opening = Message::user(format!(
                "Plan a day trip to {}. My interests: {}.",
                state.place(),
                state.interests_joined()
            ));
            state.with_messages(vec![opening])
        } else {
            state
        }
    }
}

/// Final state of a run plus the failure cause, if any
#[derive(Debug)]
pub struct PlanOutcome {
    /// Final state of the run
    pub state: PlanningState,
    /// Failure cause, if any
    pub error: Option<PlannerError>,
    /// Execution path and timings
    pub metadata: ExecutionMetadata,
}

impl PlanOutcome {
    /// True when no error was recorded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Generated itinerary; empty on failure
    pub fn itinerary(&self) -> &str {
        self.state.itinerary()
    }

    /// Coarse failure category
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error.as_ref().map(PlannerError::kind)
    }

    /// The itinerary, or [`FAILURE_MESSAGE`] when the run failed
    pub fn display_text(&self) -> &str {
        if self.error.is_some() || self.state.itinerary().is_empty() {
            FAILURE_MESSAGE
        } else {
            self.state.itinerary()
        }
    }
}

impl From<ExecutionOutcome> for PlanOutcome {
    fn from(outcome: ExecutionOutcome) -> Self {
        Self {
            state: outcome.state,
            error: outcome.error,
            metadata: outcome.metadata,
        }
    }
}

/// Inbound request as submitted by a form
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    /// Destination, trimmed
    pub place: String,
    /// Interest tags in submission order
    pub interests: Vec<String>,
    /// Day-wise preferences, single-shot workflow only
    pub preferences: Option<TripPreferences>,
}

impl PlanRequest {
    /// Parse a comma-separated interests field; blank entries are dropped
    pub fn from_form(place: &str, interests: &str) -> Self {
        Self {
            place: place.trim().to_string(),
            interests: interests
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
            preferences: None,
        }
    }

    /// Attach day-wise preferences
    pub fn with_preferences(mut self, preferences: TripPreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Initial state for a run
    pub fn into_state(self) -> PlanningState {
        let state = PlanningState::new(self.place, self.interests);
        match self.preferences {
            Some(preferences) => state.with_preferences(preferences),
            None => state,
        }
    }
}
