//! Planner configuration
//!
//! Every section is a plain serde struct with defaults, so a config can be
//! built in code, deserialized from JSON, or overlaid from the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Default per-call timeout for outbound requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default cap on planner/tools round trips
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 6;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Model provider settings
    pub llm: LlmConfig,
    /// Weather provider settings
    pub weather: WeatherConfig,
    /// Destination index settings
    pub retrieval: RetrievalConfig,
    /// Workflow shape and limits
    pub workflow: WorkflowConfig,
}

/// Chat-completion provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,
    /// Falls back to `OPENAI_API_KEY` when unset
    pub api_key: Option<String>,
    /// Provider model name
    pub model: String,

    /// Sampling temperature for planner and multi-step generation
    pub temperature: f32,

    /// Sampling temperature for the single-shot day-wise itinerary
    pub creative_temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key: None,
            model: "llama3-70b-8192".to_string(),
            temperature: 0.0,
            creative_temperature: 0.4,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Falls back to `OPENWEATHER_API_KEY` when unset
    pub api_key: Option<String>,
    /// Endpoint for current-conditions queries
    pub base_url: String,

    /// Unit system passed to the provider
    pub units: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "http://api.openweathermap.org".to_string(),
            units: "metric".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Destination dataset and search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// JSON array of `{title, content}` records
    pub dataset_path: PathBuf,

    /// Number of snippets returned per query
    pub top_k: usize,

    /// Embedding width for the hashing embedder
    pub dimensions: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("rag/destination_data.json"),
            top_k: 3,
            dimensions: 256,
        }
    }
}

/// Which workflow shape a planner runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowShape {
    /// Weather, attractions, retrieval, then generation
    Pipeline,

    /// Model-driven loop between planner and tools, then generation
    ToolLoop,

    /// One day-wise generation from trip preferences
    SingleShot,
}

/// Workflow driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Which workflow to build
    pub shape: WorkflowShape,

    /// Tool rounds allowed before generation is forced
    pub max_tool_rounds: usize,

    /// Hard bound on node executions per run
    pub max_steps: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            shape: WorkflowShape::Pipeline,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            max_steps: 100,
        }
    }
}

impl PlannerConfig {
    /// Parse a JSON config; missing sections fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overlaid with process environment variables
    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Overlay values from a key lookup
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GROQ_API_KEY").filter(|v| !v.is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = lookup("TRIPGRAPH_MODEL").filter(|v| !v.is_empty()) {
            self.llm.model = model;
        }
        if let Some(key) = lookup("WHETHER_API_KEY").filter(|v| !v.is_empty()) {
            self.weather.api_key = Some(key);
        }
        if let Some(path) = lookup("TRIPGRAPH_DATASET").filter(|v| !v.is_empty()) {
            self.retrieval.dataset_path = PathBuf::from(path);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.workflow.max_tool_rounds, 6);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.weather.timeout_secs, 10);
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.workflow.shape, WorkflowShape::Pipeline);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PlannerConfig::from_json_str(
            r#"{"workflow": {"shape": "tool_loop", "max_tool_rounds": 2}}"#,
        )
        .unwrap();
        assert_eq!(config.workflow.shape, WorkflowShape::ToolLoop);
        assert_eq!(config.workflow.max_tool_rounds, 2);
        assert_eq!(config.llm.model, "llama3-70b-8192");
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("GROQ_API_KEY", "gsk-test"),
            ("WHETHER_API_KEY", "owm-test"),
            ("TRIPGRAPH_DATASET", "/tmp/data.json"),
        ]
        .into_iter()
        .collect();

        let config = PlannerConfig::default().with_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.llm.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.weather.api_key.as_deref(), Some("owm-test"));
        assert_eq!(config.retrieval.dataset_path, PathBuf::from("/tmp/data.json"));
    }
}
