//! Itinerary prompt assembly and generation

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::llm::{ChatRequest, LlmClient, LlmError};
use crate::message::Message;
use crate::state::{PlanningState, TripPreferences};

/// Which prompt template a generation step uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptStyle {
    /// Every gathered field embedded in the system prompt
    Contextual,

    /// Place and interests only; the tool-calling workflow
    Summary,

    /// Day-wise plan from trip preferences; creative sampling
    Preferences,
}

/// Turns a planning state into one completion request
pub struct ItineraryGenerator {
    llm: Arc<dyn LlmClient>,
    temperature: f32,
    creative_temperature: f32,
}

impl ItineraryGenerator {
    /// Generator over `llm` with temperatures from `config`
    pub fn new(llm: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            llm,
            temperature: config.temperature,
            creative_temperature: config.creative_temperature,
        }
    }

    /// Sampling temperature for a prompt style
    pub fn temperature_for(&self, style: PromptStyle) -> f32 {
        match style {
            PromptStyle::Preferences => self.creative_temperature,
            PromptStyle::Contextual | PromptStyle::Summary => self.temperature,
        }
    }

    /// Prompt messages for `style`
    pub fn build_messages(&self, style: PromptStyle, state: &PlanningState) -> Vec<Message> {
        let interests = state.interests_joined();
        match style {
            PromptStyle::Contextual => vec![
                Message::system(format!(
                    "You are a helpful travel assistant planning a trip to {}. \
                     Consider interests: {}, weather: {}, attractions: {}, and destination info: {}. \
                     Provide a bullet-point itinerary.",
                    state.place(),
                    interests,
                    state.weather(),
                    state.attractions(),
                    state.retrieved_info(),
                )),
                Message::user("Plan my day trip."),
            ],
            PromptStyle::Summary => vec![Message::user(format!(
                "Create a day trip itinerary for {} focused on these interests: {}. \
                 Provide a bullet-point itinerary.",
                state.place(),
                interests,
            ))],
            PromptStyle::Preferences => {
                let preferences = state.preferences().cloned().unwrap_or_default();
                vec![Message::user(preferences_prompt(state.place(), &interests, &preferences))]
            }
        }
    }

    /// One completion; the raw text comes back unmodified.
    ///
    /// A blank completion is reported as [`LlmError::Response`].
    pub async fn generate(&self, style: PromptStyle, state: &PlanningState) -> Result<String, LlmError> {
        let request = ChatRequest::new(self.build_messages(style, state), self.temperature_for(style));
        debug!(style = ?style, place = %state.place(), "generating itinerary");

        let text = self.llm.complete(request).await?;
        if text.trim().is_empty() {
            return Err(LlmError::Response("empty completion".to_string()));
        }
        Ok(text)
    }
}

fn preferences_prompt(place: &str, interests: &str, preferences: &TripPreferences) -> String {
    format!(
        "You are an intelligent travel assistant.\n\n\
         Plan a {days}-day trip to {place} for a {travel_type} traveler with a {budget} budget.\n\n\
         Focus on these preferences: {interests}\n\n\
         The itinerary should be detailed, creative, and day-wise. Include:\n\
         - 3–4 key activities per day\n\
         - A mix of sightseeing, food, culture, and rest (if applicable)",
        days = preferences.days(),
        place = place,
        travel_type = preferences.travel_type(),
        budget = preferences.budget(),
        interests = interests,
    )
}
