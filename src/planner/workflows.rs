//! The three planning graph shapes

use std::sync::Arc;

use super::generator::{ItineraryGenerator, PromptStyle};
use super::nodes::{
    route_after_planner, DestinationInfo, FetchAttractions, FetchWeather, GenerateItinerary,
    Planner, ToolDispatch, GENERATE, PLANNER, TOOLS,
};
use crate::graph::{CompiledGraph, GraphBuilder, GraphError, NodeType, END};
use crate::llm::LlmClient;
use crate::rag::DestinationRetriever;
use crate::tools::{AttractionLookup, ToolRegistry, WeatherLookup};

/// Node names of the fixed pipeline, in execution order
pub const PIPELINE_NODES: [&str; 4] = [
    "fetch_weather",
    "fetch_attractions",
    "destination_info",
    "generate_itinerary",
];

/// `fetch_weather -> fetch_attractions -> destination_info -> generate_itinerary`
pub fn pipeline_graph(
    weather: Arc<dyn WeatherLookup>,
    attractions: Arc<dyn AttractionLookup>,
    retriever: DestinationRetriever,
    generator: Arc<ItineraryGenerator>,
) -> Result<CompiledGraph, GraphError> {
    let [weather_node, attractions_node, info_node, generate_node] = PIPELINE_NODES;

    GraphBuilder::new("trip_pipeline")
        .with_description("Weather, attractions and destination info, then one generation")
        .add_node(weather_node, NodeType::Tool, Arc::new(FetchWeather::new(weather)))
        .add_node(attractions_node, NodeType::Tool, Arc::new(FetchAttractions::new(attractions)))
        .add_node(info_node, NodeType::Retrieval, Arc::new(DestinationInfo::new(retriever)))
        .add_node(
            generate_node,
            NodeType::Agent,
            Arc::new(GenerateItinerary::new(generator, PromptStyle::Contextual)),
        )
        .set_entry_point(weather_node)
        .add_edge(weather_node, attractions_node)
        .add_edge(attractions_node, info_node)
        .add_edge(info_node, generate_node)
        .add_edge(generate_node, END)
        .compile()
}

/// `planner -> {tools, generate}`, `tools -> planner`, capped at `max_tool_rounds`
pub fn tool_loop_graph(
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    generator: Arc<ItineraryGenerator>,
    temperature: f32,
    max_tool_rounds: usize,
) -> Result<CompiledGraph, GraphError> {
    GraphBuilder::new("trip_tool_loop")
        .with_description("Model-driven tool calls, then a summary generation")
        .add_node(PLANNER, NodeType::Agent, Arc::new(Planner::new(llm, tools.clone(), temperature)))
        .add_node(TOOLS, NodeType::Tool, Arc::new(ToolDispatch::new(tools)))
        .add_node(
            GENERATE,
            NodeType::Agent,
            Arc::new(GenerateItinerary::new(generator, PromptStyle::Summary)),
        )
        .set_entry_point(PLANNER)
        .add_conditional_edges(PLANNER, "has_tool_calls", route_after_planner, [TOOLS, GENERATE])
        .add_edge(TOOLS, PLANNER)
        .add_edge(GENERATE, END)
        .with_loop_guard(TOOLS, max_tool_rounds, GENERATE)
        .compile()
}

/// One day-wise generation from trip preferences
pub fn single_shot_graph(generator: Arc<ItineraryGenerator>) -> Result<CompiledGraph, GraphError> {
    GraphBuilder::new("trip_single_shot")
        .add_node(
            "generate_itinerary",
            NodeType::Agent,
            Arc::new(GenerateItinerary::new(generator, PromptStyle::Preferences)),
        )
        .set_entry_point("generate_itinerary")
        .add_edge("generate_itinerary", END)
        .compile()
}
