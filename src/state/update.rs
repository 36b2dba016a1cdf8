//! Field-scoped state updates returned by workflow steps

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// A change produced by exactly one workflow step.
///
/// Each variant names only the fields its step may write; everything else in
/// [`PlanningState`](super::PlanningState) is carried over unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateUpdate {
    /// Weather lookup result
    Weather(String),

    /// Attraction lookup result
    Attractions(String),

    /// Retrieved destination snippets
    RetrievedInfo(String),

    /// Planner turn: one assistant entry appended to the log
    Assistant(Message),

    /// Tools turn: one result entry per resolved invocation
    ToolResults(Vec<Message>),

    /// Terminal generation: the itinerary plus the log entries recording it
    Itinerary { text: String, messages: Vec<Message> },
}

impl StateUpdate {
    /// Short label for logs and step events
    pub fn kind(&self) -> &'static str {
        match self {
            StateUpdate::Weather(_) => "weather",
            StateUpdate::Attractions(_) => "attractions",
            StateUpdate::RetrievedInfo(_) => "retrieved_info",
            StateUpdate::Assistant(_) => "assistant",
            StateUpdate::ToolResults(_) => "tool_results",
            StateUpdate::Itinerary { .. } => "itinerary",
        }
    }
}
