//! Weather lookup
//!
//! Lookups never fail: every provider problem (missing key, unknown city,
//! transport error, odd payload) is turned into a sentence the itinerary
//! prompt can carry.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::WeatherConfig;
use crate::tools::ToolError;

/// One-line natural-language weather summary for a place
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Current conditions; failures are described in the returned text
    async fn lookup_weather(&self, place: &str) -> String;
}

/// OpenWeatherMap current-weather client
pub struct OpenWeatherClient {
    client: reqwest::Client,
    config: WeatherConfig,
}

impl OpenWeatherClient {
    /// Build the client; the key may be absent
    pub fn new(config: WeatherConfig) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolError::ClientSetup(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/data/2.5/weather", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    async fn lookup_weather(&self, place: &str) -> String {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            warn!("weather lookup skipped: no API key configured");
            return "Weather API key not found. Please set 'WHETHER_API_KEY' in your environment."
                .to_string();
        };

        debug!(place = %place, "requesting current weather");
        let response = self
            .client
            .get(self.endpoint())
            .query(&[("q", place), ("appid", api_key), ("units", self.config.units.as_str())])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(place = %place, error = %e, "weather request failed");
                return format!("Network error while fetching weather: {}", e);
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return format!("Network error while fetching weather: {}", e),
        };

        match serde_json::from_str::<Value>(&body) {
            Ok(payload) => summarize_response(place, status, &payload),
            Err(e) => {
                warn!(place = %place, status, "weather response was not JSON");
                format!("Unexpected error: {}", e)
            }
        }
    }
}

/// Map a provider status and JSON body to the summary sentence
pub fn summarize_response(place: &str, status: u16, payload: &Value) -> String {
    match status {
        200 => {
            let temp = payload.pointer("/main/temp").filter(|t| t.is_number());
            let description = payload
                .pointer("/weather/0/description")
                .and_then(Value::as_str);

            match (temp, description) {
                (Some(temp), Some(description)) => format!(
                    "The weather in {} is {} with a temperature of {}°C.",
                    place,
                    capitalize(description),
                    temp
                ),
                _ => "Unexpected error: malformed weather response".to_string(),
            }
        }
        404 => format!("City '{}' not found in weather database.", place),
        _ => {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            format!("Failed to fetch weather. Error: {}", message)
        }
    }
}

/// First letter upper-cased, the rest lower-cased
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Canned weather used when no provider is wired in
#[derive(Debug, Clone, Default)]
pub struct StaticWeather;

#[async_trait]
impl WeatherLookup for StaticWeather {
    async fn lookup_weather(&self, place: &str) -> String {
        format!("The weather in {} is sunny and 28°C.", place)
    }
}
