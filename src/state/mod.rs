//! Planning state threaded through the workflow
//!
//! A [`PlanningState`] is built once per request and handed from step to
//! step. Steps never touch it directly: each returns a [`StateUpdate`] that
//! names only the field(s) the step owns, and the engine merges it with
//! [`PlanningState::apply`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::{self, Message};

pub mod preferences;
pub mod update;

pub use preferences::{Budget, TravelType, TripPreferences};
pub use update::StateUpdate;

/// Errors raised while merging updates into the planning state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// A second generation tried to overwrite the itinerary
    #[error("itinerary has already been written for this run")]
    ItineraryAlreadySet,

    /// Preferences outside the accepted ranges
    #[error("invalid trip preferences: {0}")]
    InvalidPreferences(String),
}

/// The single record threaded through a planning run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningState {
    messages: Vec<Message>,
    place: String,
    interests: Vec<String>,
    weather: String,
    attractions: String,
    retrieved_info: String,
    itinerary: String,
    preferences: Option<TripPreferences>,
    tool_rounds: usize,
}

impl PlanningState {
    /// Create the initial state for a request. Result fields start empty.
    pub fn new<I, S>(place: impl Into<String>, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            place: place.into(),
            interests: interests.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Seed the conversation log (tool-calling workflow)
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Attach trip preferences (single-shot workflow)
    pub fn with_preferences(mut self, preferences: TripPreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Conversation log, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Destination as submitted
    pub fn place(&self) -> &str {
        &self.place
    }

    /// Interest tags as submitted
    pub fn interests(&self) -> &[String] {
        &self.interests
    }

    /// Interests joined the way prompts and retrieval queries expect them
    pub fn interests_joined(&self) -> String {
        self.interests.join(", ")
    }

    /// Weather summary; empty until looked up
    pub fn weather(&self) -> &str {
        &self.weather
    }

    /// Attraction summary; empty until looked up
    pub fn attractions(&self) -> &str {
        &self.attractions
    }

    /// Retrieved snippets, one per line
    pub fn retrieved_info(&self) -> &str {
        &self.retrieved_info
    }

    /// Generated itinerary; empty until generation succeeds
    pub fn itinerary(&self) -> &str {
        &self.itinerary
    }

    /// Day-wise preferences, if any
    pub fn preferences(&self) -> Option<&TripPreferences> {
        self.preferences.as_ref()
    }

    /// Completed tool rounds in this run
    pub fn tool_rounds(&self) -> usize {
        self.tool_rounds
    }

    /// Most recent assistant entry, if the model has answered yet
    pub fn latest_assistant(&self) -> Option<&Message> {
        message::latest_assistant(&self.messages)
    }

    /// Merge a step's update in place
    pub fn apply(&mut self, update: StateUpdate) -> Result<(), StateError> {
        match update {
            StateUpdate::Weather(weather) => self.weather = weather,
            StateUpdate::Attractions(attractions) => self.attractions = attractions,
            StateUpdate::RetrievedInfo(info) => self.retrieved_info = info,
            StateUpdate::Assistant(message) => self.messages.push(message),
            StateUpdate::ToolResults(results) => {
                self.messages.extend(results);
                self.tool_rounds += 1;
            }
            StateUpdate::Itinerary { text, messages } => {
                if !self.itinerary.is_empty() {
                    return Err(StateError::ItineraryAlreadySet);
                }
                self.itinerary = text;
                self.messages.extend(messages);
            }
        }
        Ok(())
    }

    /// Return a new state with `update` merged; `self` is left untouched
    pub fn with_update(&self, update: StateUpdate) -> Result<Self, StateError> {
        let mut next = self.clone();
        next.apply(update)?;
        Ok(next)
    }
}
