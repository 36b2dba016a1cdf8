//! Step functions for the planning workflows

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::generator::{ItineraryGenerator, PromptStyle};
use crate::graph::NodeFunction;
use crate::llm::{ChatRequest, LlmClient};
use crate::message::Message;
use crate::rag::DestinationRetriever;
use crate::state::{PlanningState, StateUpdate};
use crate::tools::{AttractionLookup, ToolContext, ToolError, ToolRegistry, WeatherLookup};
use crate::{PlannerError, Result};

/// Node name for the planner turn
pub const PLANNER: &str = "planner";
/// Node name for tool dispatch
pub const TOOLS: &str = "tools";
/// Node name for generation in the tool-calling workflow
pub const GENERATE: &str = "generate";

const PLANNER_SYSTEM_PROMPT: &str = "You are a helpful travel assistant. \
    Use the available tools to check the weather and attractions for the destination \
    before answering. When you have what you need, reply with a short plain-text summary.";

/// Weather lookup for the run's place
pub struct FetchWeather {
    lookup: Arc<dyn WeatherLookup>,
}

impl FetchWeather {
    /// Node over a weather lookup
    pub fn new(lookup: Arc<dyn WeatherLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl NodeFunction for FetchWeather {
    async fn execute(&self, state: &PlanningState) -> Result<StateUpdate> {
        Ok(StateUpdate::Weather(self.lookup.lookup_weather(state.place()).await))
    }
}

/// Attraction lookup for the run's place and interests
pub struct FetchAttractions {
    lookup: Arc<dyn AttractionLookup>,
}

impl FetchAttractions {
    /// Node over an attraction lookup
    pub fn new(lookup: Arc<dyn AttractionLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl NodeFunction for FetchAttractions {
    async fn execute(&self, state: &PlanningState) -> Result<StateUpdate> {
        let attractions = self
            .lookup
            .lookup_attractions(state.place(), state.interests())
            .await;
        Ok(StateUpdate::Attractions(attractions))
    }
}

/// Destination snippets for the run's interests
pub struct DestinationInfo {
    retriever: DestinationRetriever,
}

impl DestinationInfo {
    /// Node over a destination retriever
    pub fn new(retriever: DestinationRetriever) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl NodeFunction for DestinationInfo {
    async fn execute(&self, state: &PlanningState) -> Result<StateUpdate> {
        Ok(StateUpdate::RetrievedInfo(
            self.retriever.retrieve_info(state.interests()),
        ))
    }
}

/// Terminal generation step; writes the itinerary once
pub struct GenerateItinerary {
    generator: Arc<ItineraryGenerator>,
    style: PromptStyle,
}

impl GenerateItinerary {
    /// Generation node using the given prompt style
    pub fn new(generator: Arc<ItineraryGenerator>, style: PromptStyle) -> Self {
        Self { generator, style }
    }
}

#[async_trait]
impl NodeFunction for GenerateItinerary {
    async fn execute(&self, state: &PlanningState) -> Result<StateUpdate> {
        let text = self.generator.generate(self.style, state).await?;
        info!(place = %state.place(), chars = text.len(), "itinerary generated");

        let mut messages = Vec::with_capacity(2);
        if self.style == PromptStyle::Preferences {
            let preferences = state.preferences().cloned().unwrap_or_default();
            messages.push(Message::user(format!(
                "{}, {}, {}, {}, {}",
                state.place(),
                state.interests_joined(),
                preferences.days(),
                preferences.budget(),
                preferences.travel_type(),
            )));
        }
        messages.push(Message::assistant(text.clone()));

        Ok(StateUpdate::Itinerary { text, messages })
    }
}

/// Model turn with the tool schema declared
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    temperature: f32,
}

impl Planner {
    /// Planner turn with `tools` declared
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, temperature: f32) -> Self {
        Self {
            llm,
            tools,
            temperature,
        }
    }
}

#[async_trait]
impl NodeFunction for Planner {
    async fn execute(&self, state: &PlanningState) -> Result<StateUpdate> {
        let mut messages = Vec::with_capacity(state.messages().len() + 1);
        messages.push(Message::system(PLANNER_SYSTEM_PROMPT));
        messages.extend(state.messages().iter().cloned());

        let request = ChatRequest::new(messages, self.temperature).with_tools(self.tools.specs());
        let response = self.llm.chat(request).await?;

        debug!(
            tool_calls = response.tool_calls().len(),
            round = state.tool_rounds(),
            "planner responded"
        );
        Ok(StateUpdate::Assistant(Message::from_response(response)))
    }
}

/// Resolves every pending tool call on the latest assistant entry
pub struct ToolDispatch {
    tools: ToolRegistry,
}

impl ToolDispatch {
    /// Dispatch over `tools`
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl NodeFunction for ToolDispatch {
    async fn execute(&self, state: &PlanningState) -> Result<StateUpdate> {
        let calls = state
            .latest_assistant()
            .map(|message| message.tool_calls.clone())
            .unwrap_or_default();

        let context = ToolContext {
            place: state.place().to_string(),
            interests: state.interests().to_vec(),
        };

        let mut results = Vec::with_capacity(calls.len());
        for call in &calls {
            let output = match self
                .tools
                .execute(&call.name, call.arguments.clone(), &context)
                .await
            {
                Ok(output) => output,
                // Bad arguments go back to the model; unknown tools stay fatal
                Err(PlannerError::Tool(ToolError::InvalidParameters { tool, reason })) => {
                    warn!(tool = %tool, call_id = %call.id, reason = %reason, "tool call rejected");
                    format!("Error: {}", reason)
                }
                Err(e) => return Err(e),
            };
            debug!(tool = %call.name, call_id = %call.id, "tool resolved");
            results.push(Message::tool_result(call, output));
        }

        Ok(StateUpdate::ToolResults(results))
    }
}

/// Branch after the planner: `tools` when the latest assistant entry
/// carries tool requests, `generate` otherwise
pub fn route_after_planner(state: &PlanningState) -> String {
    let pending = state
        .latest_assistant()
        .map(|message| message.has_pending_tools())
        .unwrap_or(false);

    let next = if pending { TOOLS } else { GENERATE };
    next.to_string()
}
