//! Tool integration for the planning workflow
//!
//! Lookups the model may invoke by name are wrapped as [`Tool`]s and kept in
//! a [`ToolRegistry`]. The registry also renders the declared tool schema
//! sent along with planner requests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::Result;

pub mod attractions;
pub mod builtin;
pub mod weather;

pub use attractions::{AttractionLookup, StaticAttractions};
pub use builtin::{AttractionsTool, WeatherTool};
pub use weather::{OpenWeatherClient, StaticWeather, WeatherLookup};

/// Errors related to tool operations
#[derive(Error, Debug)]
pub enum ToolError {
    /// The model asked for a tool that is not registered
    #[error("unsupported tool requested: {0}")]
    UnsupportedTool(String),

    /// Arguments failed validation
    #[error("Invalid parameters for {tool}: {reason}")]
    InvalidParameters {
        /// Tool that rejected the call
        tool: String,
        /// Why the arguments were rejected; echoed back to the model
        reason: String,
    },

    /// A tool's HTTP client could not be built
    #[error("Tool client setup failed: {0}")]
    ClientSetup(String),
}

/// Tool parameter specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,

    /// Parameter type (string, number, boolean, object, array)
    pub param_type: String,

    /// Whether the model is told the parameter is required
    pub required: bool,

    /// Parameter description
    pub description: Option<String>,
}

/// Tool specification declared to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name the model uses to invoke it
    pub name: String,

    /// Tool description
    pub description: String,

    /// Parameters accepted by the tool
    pub parameters: Vec<ToolParameter>,
}

impl ToolSpec {
    /// JSON Schema object describing the parameters
    pub fn parameters_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut property = json!({ "type": param.param_type });
            if let Some(description) = &param.description {
                property["description"] = json!(description);
            }
            properties.insert(param.name.clone(), property);
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Request-scoped context handed to a tool
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Destination of the current run
    pub place: String,

    /// Interest tags of the current run
    pub interests: Vec<String>,
}

/// Trait for implementing tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool specification
    fn spec(&self) -> ToolSpec;

    /// Validate parameters before execution
    async fn validate(&self, params: &Value) -> Result<()> {
        let spec = self.spec();
        for param in spec.parameters.iter().filter(|p| p.required) {
            if params.get(&param.name).is_none() {
                return Err(ToolError::InvalidParameters {
                    tool: spec.name.clone(),
                    reason: format!("missing required parameter: {}", param.name),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Execute the tool and return its text result
    async fn execute(&self, params: Value, context: &ToolContext) -> Result<String>;
}

/// Tool registry for managing available tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the weather and attraction lookups
    pub fn with_lookups(
        weather: Arc<dyn WeatherLookup>,
        attractions: Arc<dyn AttractionLookup>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WeatherTool::new(weather)));
        registry.register(Arc::new(AttractionsTool::new(attractions)));
        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.spec().name;
        self.tools.insert(name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List registered tool names in sorted order
    pub fn list(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Specs for every registered tool
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }

    /// True when no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve a tool by name and execute it
    pub async fn execute(&self, name: &str, params: Value, context: &ToolContext) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnsupportedTool(name.to_string()))?;

        tool.validate(&params).await?;
        tool.execute(params, context).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlannerError;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "echo".to_string(),
                description: "Echo the message back".to_string(),
                parameters: vec![ToolParameter {
                    name: "message".to_string(),
                    param_type: "string".to_string(),
                    required: true,
                    description: None,
                }],
            }
        }

        async fn execute(&self, params: Value, _context: &ToolContext) -> Result<String> {
            Ok(params["message"].as_str().unwrap_or_default().to_string())
        }
    }

    #[tokio::test]
    async fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        assert!(registry.get("echo").is_some());
        assert_eq!(registry.list(), vec!["echo"]);

        let out = registry
            .execute("echo", json!({"message": "hi"}), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_unsupported() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("currency_converter", json!({}), &ToolContext::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlannerError::Tool(ToolError::UnsupportedTool(ref name)) if name == "currency_converter"
        ));
        assert!(err.to_string().contains("unsupported tool requested"));
    }

    #[tokio::test]
    async fn test_missing_required_parameter() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let err = registry
            .execute("echo", json!({}), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PlannerError::Tool(ToolError::InvalidParameters { .. })));
    }

    #[test]
    fn test_parameters_schema() {
        let schema = EchoTool.spec().parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["message"]["type"], "string");
        assert_eq!(schema["required"], json!(["message"]));
    }
}
