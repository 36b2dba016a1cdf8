//! Lookups exposed to the model as callable tools

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{AttractionLookup, Tool, ToolContext, ToolError, ToolParameter, ToolSpec, WeatherLookup};
use crate::Result;

/// Name the model uses for the weather lookup
pub const WEATHER_TOOL: &str = "get_weather";
/// Name the model uses for the attraction lookup
pub const ATTRACTIONS_TOOL: &str = "get_attractions";

fn city_parameter() -> ToolParameter {
    ToolParameter {
        name: "city".to_string(),
        param_type: "string".to_string(),
        required: true,
        description: Some("City to look up, e.g. 'Paris'".to_string()),
    }
}

/// `city` argument, falling back to the run's place when the model omits it
fn city_argument(tool: &str, params: &Value, context: &ToolContext) -> Result<String> {
    match params.get("city") {
        None | Some(Value::Null) => Ok(context.place.clone()),
        Some(Value::String(city)) if city.trim().is_empty() => Ok(context.place.clone()),
        Some(Value::String(city)) => Ok(city.clone()),
        Some(other) => Err(ToolError::InvalidParameters {
            tool: tool.to_string(),
            reason: format!("city must be a string, got {}", other),
        }
        .into()),
    }
}

/// `get_weather` over a [`WeatherLookup`]
pub struct WeatherTool {
    lookup: Arc<dyn WeatherLookup>,
}

impl WeatherTool {
    /// Tool over `lookup`
    pub fn new(lookup: Arc<dyn WeatherLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: WEATHER_TOOL.to_string(),
            description: "Return weather info for a city.".to_string(),
            parameters: vec![city_parameter()],
        }
    }

    async fn validate(&self, params: &Value) -> Result<()> {
        city_argument(WEATHER_TOOL, params, &ToolContext::default()).map(|_| ())
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> Result<String> {
        let city = city_argument(WEATHER_TOOL, &params, context)?;
        Ok(self.lookup.lookup_weather(&city).await)
    }
}

/// `get_attractions` over an [`AttractionLookup`]
pub struct AttractionsTool {
    lookup: Arc<dyn AttractionLookup>,
}

impl AttractionsTool {
    /// Tool over `lookup`
    pub fn new(lookup: Arc<dyn AttractionLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Tool for AttractionsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: ATTRACTIONS_TOOL.to_string(),
            description: "Return popular attractions for a city.".to_string(),
            parameters: vec![city_parameter()],
        }
    }

    async fn validate(&self, params: &Value) -> Result<()> {
        city_argument(ATTRACTIONS_TOOL, params, &ToolContext::default()).map(|_| ())
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> Result<String> {
        let city = city_argument(ATTRACTIONS_TOOL, &params, context)?;
        Ok(self
            .lookup
            .lookup_attractions(&city, &context.interests)
            .await)
    }
}
