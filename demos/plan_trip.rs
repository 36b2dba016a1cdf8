//! Plan a day trip from the command line
//!
//! ```text
//! cargo run --example plan_trip -- Paris "food, culture"
//! ```
//!
//! Reads `GROQ_API_KEY` and `WHETHER_API_KEY` from the environment. Set
//! `TRIPGRAPH_SHAPE` to `tool_loop` or `single_shot` to try the other
//! workflows.

use tracing_subscriber::EnvFilter;
use tripgraph::config::{PlannerConfig, WorkflowShape};
use tripgraph::planner::{PlanRequest, TripPlanner};
use tripgraph::state::{Budget, TravelType, TripPreferences};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tripgraph=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let place = args.next().unwrap_or_else(|| "Paris".to_string());
    let interests = args.next().unwrap_or_else(|| "food, culture".to_string());

    let mut config = PlannerConfig::from_env();
    config.workflow.shape = match std::env::var("TRIPGRAPH_SHAPE").as_deref() {
        Ok("tool_loop") => WorkflowShape::ToolLoop,
        Ok("single_shot") => WorkflowShape::SingleShot,
        _ => WorkflowShape::Pipeline,
    };

    let planner = TripPlanner::from_config(&config)?;

    let mut request = PlanRequest::from_form(&place, &interests);
    if config.workflow.shape == WorkflowShape::SingleShot {
        request = request.with_preferences(TripPreferences::new(3, Budget::Medium, TravelType::Solo)?);
    }

    println!("Planning a trip to {} ({:?} workflow)...\n", request.place, config.workflow.shape);
    let outcome = planner.run(request.into_state()).await;

    if let Some(kind) = outcome.failure_kind() {
        eprintln!("run failed: {}", kind);
    }
    println!("{}", outcome.display_text());
    println!(
        "\n{} steps: {}",
        outcome.metadata.nodes_executed(),
        outcome.metadata.path.join(" -> ")
    );

    Ok(())
}
