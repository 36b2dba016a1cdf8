//! Integration tests for the fixed pipeline workflow

use std::sync::Arc;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use tripgraph::config::{PlannerConfig, WorkflowShape};
use tripgraph::llm::{LlmClient, ScriptedLlmClient};
use tripgraph::message::MessageRole;
use tripgraph::planner::{PlannerComponents, TripPlanner, FAILURE_MESSAGE};
use tripgraph::rag::{DocumentIndex, HashingEmbedder};
use tripgraph::tools::{StaticAttractions, StaticWeather};
use tripgraph::{FailureKind, PlanningState};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/destinations.json");

const FOOD_OR_CULTURE: [&str; 3] = [
    "Paris Food Guide",
    "Paris Culture Highlights",
    "Lyon Food and Culture",
];

fn fixture_index() -> Arc<DocumentIndex> {
    Arc::new(DocumentIndex::load(FIXTURE, Arc::new(HashingEmbedder::default())).unwrap())
}

fn pipeline(llm: Arc<dyn LlmClient>) -> TripPlanner {
    let mut config = PlannerConfig::default();
    config.workflow.shape = WorkflowShape::Pipeline;

    TripPlanner::new(
        &config,
        PlannerComponents {
            llm,
            weather: Arc::new(StaticWeather),
            attractions: Arc::new(StaticAttractions::default()),
            index: fixture_index(),
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_paris_end_to_end() {
    let itinerary = "- 09:00 Croissants in Le Marais\n- 11:00 Louvre\n- 13:00 Bistro lunch";
    let llm = Arc::new(ScriptedLlmClient::text(itinerary));
    let planner = pipeline(llm.clone());

    let outcome = planner
        .run(PlanningState::new("Paris", ["food", "culture"]))
        .await;
    assert!(outcome.is_success(), "run failed: {:?}", outcome.error);

    let state = &outcome.state;
    assert!(state.weather().contains("Paris"));
    assert!(state.attractions().contains("Paris"));

    let snippets: Vec<&str> = state.retrieved_info().lines().collect();
    assert!(!snippets.is_empty() && snippets.len() <= 3);
    for line in &snippets {
        assert!(
            FOOD_OR_CULTURE.iter().any(|title| line.starts_with(&format!("{}: ", title))),
            "unexpected snippet: {}",
            line
        );
    }

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].messages[0].content;
    assert!(prompt.contains(state.weather()));
    assert!(prompt.contains(state.attractions()));
    assert!(prompt.contains(state.retrieved_info()));
    assert!(prompt.contains("food, culture"));

    assert_eq!(state.itinerary(), itinerary);
    assert_eq!(outcome.display_text(), itinerary);
    assert_eq!(
        outcome.metadata.path,
        vec!["fetch_weather", "fetch_attractions", "destination_info", "generate_itinerary"]
    );

    let last = state.messages().last().unwrap();
    assert_eq!(last.role, MessageRole::Assistant);
    assert_eq!(last.content, itinerary);
}

#[tokio::test]
async fn test_each_step_only_writes_its_own_field() {
    let planner = pipeline(Arc::new(ScriptedLlmClient::text("- Walk the Seine")));
    let initial = PlanningState::new("Paris", ["food", "culture"]);

    let events: Vec<_> = planner.stream(initial.clone()).collect().await;
    assert_eq!(events.len(), 4);
    let states: Vec<PlanningState> = events.into_iter().map(|e| e.unwrap().state).collect();

    // fetch_weather
    assert!(!states[0].weather().is_empty());
    assert_eq!(states[0].attractions(), initial.attractions());
    assert_eq!(states[0].retrieved_info(), initial.retrieved_info());
    assert_eq!(states[0].itinerary(), "");
    assert_eq!(states[0].place(), "Paris");
    assert_eq!(states[0].interests(), initial.interests());

    // fetch_attractions
    assert_eq!(states[1].weather(), states[0].weather());
    assert!(!states[1].attractions().is_empty());
    assert_eq!(states[1].retrieved_info(), "");

    // destination_info
    assert_eq!(states[2].weather(), states[0].weather());
    assert_eq!(states[2].attractions(), states[1].attractions());
    assert!(!states[2].retrieved_info().is_empty());
    assert_eq!(states[2].itinerary(), "");
    assert_eq!(states[2].messages(), initial.messages());

    // generate_itinerary
    assert_eq!(states[3].weather(), states[0].weather());
    assert_eq!(states[3].attractions(), states[1].attractions());
    assert_eq!(states[3].retrieved_info(), states[2].retrieved_info());
    assert_eq!(states[3].itinerary(), "- Walk the Seine");
}

#[tokio::test]
async fn test_generation_failure_leaves_itinerary_empty() {
    let planner = pipeline(Arc::new(
        ScriptedLlmClient::new(vec![]).then_fail("503 upstream unavailable"),
    ));

    let outcome = planner.run(PlanningState::new("Paris", ["food"])).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::GenerationFailed));
    assert_eq!(outcome.itinerary(), "");
    assert_eq!(outcome.display_text(), FAILURE_MESSAGE);
    assert_eq!(outcome.metadata.failed_node.as_deref(), Some("generate_itinerary"));
    assert!(!outcome.state.weather().is_empty());
    assert!(!outcome.state.retrieved_info().is_empty());
}

#[tokio::test]
async fn test_blank_completion_is_reported_as_failure() {
    let planner = pipeline(Arc::new(ScriptedLlmClient::text("")));

    let outcome = planner.run(PlanningState::new("Paris", ["food"])).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.failure_kind(), Some(FailureKind::GenerationFailed));
    assert_eq!(outcome.itinerary(), "");
    assert_eq!(outcome.display_text(), FAILURE_MESSAGE);
    assert_eq!(outcome.metadata.failed_node.as_deref(), Some("generate_itinerary"));
}

#[tokio::test]
async fn test_empty_place_is_degraded_not_rejected() {
    let planner = pipeline(Arc::new(ScriptedLlmClient::text("- Wander")));
    let outcome = planner.run(PlanningState::new("", Vec::<String>::new())).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.itinerary(), "- Wander");
}

#[tokio::test]
async fn test_concurrent_runs_share_one_planner() {
    let planner = pipeline(Arc::new(ScriptedLlmClient::always(
        tripgraph::message::AssistantResponse::Text("- Day plan".into()),
    )));

    let runs = ["Paris", "Lyon", "Nice", "Lille"].map(|place| {
        let planner = planner.clone();
        tokio::spawn(async move { planner.run(PlanningState::new(place, ["food"])).await })
    });

    for (handle, place) in runs.into_iter().zip(["Paris", "Lyon", "Nice", "Lille"]) {
        let outcome = handle.await.unwrap();
        assert!(outcome.is_success());
        assert!(outcome.state.weather().contains(place));
    }
    assert_eq!(planner.engine().history().len(), 4);
}
