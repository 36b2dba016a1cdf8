//! Integration tests for the tool-calling workflow

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use tripgraph::config::{PlannerConfig, WorkflowShape};
use tripgraph::llm::{ChatRequest, LlmClient, LlmError, ScriptedLlmClient};
use tripgraph::message::{AssistantResponse, Message, MessageRole, ToolCall};
use tripgraph::planner::nodes::{GENERATE, PLANNER, TOOLS};
use tripgraph::planner::{route_after_planner, PlannerComponents, TripPlanner, FAILURE_MESSAGE};
use tripgraph::rag::{DocumentIndex, HashingEmbedder};
use tripgraph::tools::{StaticAttractions, StaticWeather, ToolError};
use tripgraph::{FailureKind, PlannerError, PlanningState};

/// Asks for the weather whenever tools are declared, otherwise answers in text
struct ToolHungryClient;

#[async_trait]
impl LlmClient for ToolHungryClient {
    async fn chat(&self, request: ChatRequest) -> Result<AssistantResponse, LlmError> {
        if request.tools.is_empty() {
            Ok(AssistantResponse::Text("- Morning: museum\n- Evening: river walk".into()))
        } else {
            Ok(AssistantResponse::ToolRequests(vec![ToolCall::new(
                "get_weather",
                json!({"city": "Paris"}),
            )]))
        }
    }
}

fn tool_loop(llm: Arc<dyn LlmClient>, max_tool_rounds: usize) -> TripPlanner {
    let mut config = PlannerConfig::default();
    config.workflow.shape = WorkflowShape::ToolLoop;
    config.workflow.max_tool_rounds = max_tool_rounds;

    TripPlanner::new(
        &config,
        PlannerComponents {
            llm,
            weather: Arc::new(StaticWeather),
            attractions: Arc::new(StaticAttractions::default()),
            index: Arc::new(DocumentIndex::empty(Arc::new(HashingEmbedder::default()))),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_unsupported_tool_fails_the_run() {
    let llm = Arc::new(ScriptedLlmClient::new(vec![AssistantResponse::ToolRequests(vec![
        ToolCall::new("currency_converter", json!({"amount": 100, "to": "EUR"})),
    ])]));
    let planner = tool_loop(llm.clone(), 6);

    let outcome = planner.run(PlanningState::new("Paris", ["food"])).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::UnsupportedTool));
    assert_eq!(
        outcome.failure_kind().map(|kind| kind.to_string()).as_deref(),
        Some("unsupported tool requested")
    );
    assert!(matches!(
        outcome.error,
        Some(PlannerError::Tool(ToolError::UnsupportedTool(ref name))) if name == "currency_converter"
    ));
    assert_eq!(outcome.itinerary(), "");
    assert_eq!(outcome.display_text(), FAILURE_MESSAGE);
    assert_eq!(outcome.metadata.failed_node.as_deref(), Some(TOOLS));

    // The failed dispatch added nothing to the log and no round was counted
    assert_eq!(outcome.state.tool_rounds(), 0);
    assert!(outcome
        .state
        .messages()
        .iter()
        .all(|message| message.role != MessageRole::Tool));
    assert_eq!(llm.requests().len(), 1);
}

#[tokio::test]
async fn test_tool_round_then_generation() {
    let llm = Arc::new(
        ScriptedLlmClient::new(vec![AssistantResponse::ToolRequests(vec![
            ToolCall::new("get_weather", json!({"city": "Paris"})),
            ToolCall::new("get_attractions", json!({"city": "Paris"})),
        ])])
        .then_respond(AssistantResponse::Text("I have what I need.".into()))
        .then_respond(AssistantResponse::Text("- 10:00 Louvre\n- 13:00 Lunch".into())),
    );
    let planner = tool_loop(llm.clone(), 6);

    let outcome = planner.run(PlanningState::new("Paris", ["food", "art"])).await;
    assert!(outcome.is_success(), "run failed: {:?}", outcome.error);

    let roles: Vec<MessageRole> = outcome.state.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Tool,
            MessageRole::Tool,
            MessageRole::Assistant,
            MessageRole::Assistant,
        ]
    );
    assert_eq!(outcome.state.tool_rounds(), 1);
    assert_eq!(outcome.itinerary(), "- 10:00 Louvre\n- 13:00 Lunch");
    assert_eq!(
        outcome.metadata.path,
        vec![PLANNER, TOOLS, PLANNER, GENERATE]
    );
    assert_eq!(outcome.metadata.forced_fallbacks, 0);

    let tool_output = &outcome.state.messages()[2].content;
    assert_eq!(tool_output, "The weather in Paris is sunny and 28°C.");

    let requests = llm.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].tools.len(), 2);
    assert!(requests[2].tools.is_empty());
    assert!(requests[2].messages[0].content.contains("Paris"));
    assert!(requests[2].messages[0].content.contains("food, art"));
}

#[tokio::test]
async fn test_bad_tool_arguments_are_returned_to_the_model() {
    let bad = ToolCall::new("get_weather", json!({"city": 42}));
    let llm = Arc::new(
        ScriptedLlmClient::new(vec![AssistantResponse::ToolRequests(vec![bad.clone()])])
            .then_respond(AssistantResponse::Text("Weather unavailable, planning anyway.".into()))
            .then_respond(AssistantResponse::Text("- 10:00 Louvre".into())),
    );

    let outcome = tool_loop(llm.clone(), 6)
        .run(PlanningState::new("Paris", ["art"]))
        .await;

    assert!(outcome.is_success(), "run failed: {:?}", outcome.error);
    assert_eq!(outcome.itinerary(), "- 10:00 Louvre");
    assert_eq!(outcome.state.tool_rounds(), 1);

    let tool_message = &outcome.state.messages()[2];
    assert_eq!(tool_message.role, MessageRole::Tool);
    assert_eq!(tool_message.tool_call_id.as_deref(), Some(bad.id.as_str()));
    assert_eq!(tool_message.content, "Error: city must be a string, got 42");

    // The second planner turn saw the error entry
    let requests = llm.requests();
    assert!(requests[1]
        .messages
        .iter()
        .any(|message| message.content == "Error: city must be a string, got 42"));
}

#[tokio::test]
async fn test_tool_results_answer_call_ids() {
    let call = ToolCall::new("get_attractions", json!({"city": "Rome"}));
    let llm = Arc::new(
        ScriptedLlmClient::new(vec![AssistantResponse::ToolRequests(vec![call.clone()])])
            .then_respond(AssistantResponse::Text("done".into()))
            .then_respond(AssistantResponse::Text("- Colosseum".into())),
    );

    let outcome = tool_loop(llm, 6)
        .run(PlanningState::new("Rome", ["history"]))
        .await;

    let tool_message = outcome
        .state
        .messages()
        .iter()
        .find(|message| message.role == MessageRole::Tool)
        .unwrap();
    assert_eq!(tool_message.tool_call_id.as_deref(), Some(call.id.as_str()));
    assert!(tool_message.content.starts_with("Top attractions in Rome"));
}

#[tokio::test]
async fn test_zero_cap_goes_straight_to_generation() {
    let outcome = tool_loop(Arc::new(ToolHungryClient), 0)
        .run(PlanningState::new("Paris", ["food"]))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.metadata.path, vec![PLANNER, GENERATE]);
    assert_eq!(outcome.metadata.forced_fallbacks, 1);
    assert_eq!(outcome.state.tool_rounds(), 0);
}

#[test]
fn test_route_is_stable_across_repeated_calls() {
    let state = PlanningState::new("Paris", ["food"]).with_messages(vec![
        Message::user("Plan my trip"),
        Message::assistant_with_tools("", vec![ToolCall::new("get_weather", json!({}))]),
    ]);
    let before = state.clone();

    for _ in 0..5 {
        assert_eq!(route_after_planner(&state), TOOLS);
    }
    assert_eq!(state, before);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_tool_loop_terminates_at_cap(cap in 0usize..8) {
        let outcome = tokio_test::block_on(async {
            tool_loop(Arc::new(ToolHungryClient), cap)
                .run(PlanningState::new("Paris", ["food"]))
                .await
        });

        prop_assert!(outcome.is_success());
        prop_assert_eq!(outcome.state.tool_rounds(), cap);
        prop_assert_eq!(outcome.metadata.path.len(), 2 * cap + 2);
        prop_assert_eq!(outcome.metadata.forced_fallbacks, 1);
        prop_assert_eq!(outcome.metadata.path.last().map(String::as_str), Some(GENERATE));
        prop_assert!(!outcome.itinerary().is_empty());
    }

    #[test]
    fn prop_large_caps_are_not_cut_short_by_step_limit(cap in 50usize..80) {
        let outcome = tokio_test::block_on(async {
            tool_loop(Arc::new(ToolHungryClient), cap)
                .run(PlanningState::new("Paris", ["food"]))
                .await
        });

        prop_assert!(outcome.is_success(), "run failed: {:?}", outcome.error);
        prop_assert_eq!(outcome.state.tool_rounds(), cap);
        prop_assert_eq!(outcome.metadata.path.len(), 2 * cap + 2);
        prop_assert_eq!(outcome.metadata.path.last().map(String::as_str), Some(GENERATE));
    }

    #[test]
    fn prop_route_depends_only_on_latest_assistant(
        entries in prop::collection::vec(0u8..4, 0..12)
    ) {
        let messages: Vec<Message> = entries
            .iter()
            .map(|entry| match entry {
                0 => Message::user("hello"),
                1 => Message::assistant("plain answer"),
                2 => Message::assistant_with_tools(
                    "",
                    vec![ToolCall::new("get_weather", json!({"city": "Paris"}))],
                ),
                _ => Message::tool_result(&ToolCall::new("get_weather", json!({})), "sunny"),
            })
            .collect();

        let expected = match entries.iter().rev().find(|entry| **entry == 1 || **entry == 2) {
            Some(2) => TOOLS,
            _ => GENERATE,
        };

        let state = PlanningState::new("Paris", ["food"]).with_messages(messages);
        let snapshot = state.clone();

        prop_assert_eq!(route_after_planner(&state), expected);
        prop_assert_eq!(route_after_planner(&state), expected);
        prop_assert_eq!(state, snapshot);
    }
}
