use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::adapters::{FoodInspectionsAdapter, MuralsAdapter, OpenDataClient, PermitsAdapter, ViolationsAdapter};
use crate::config::Settings;
use crate::error::AgentError;
use crate::geocoder::NominatimGeocoder;

mod geo;
mod search;

pub use geo::{GeocodeTool, ProximityTool};
pub use search::{SearchTool, ViolationDetailsTool};

/// Arguments as the LLM sent them.
pub type ToolArgs = HashMap<String, Value>;

/// A read-only capability the orchestrator may invoke by name.
///
/// `invoke` never panics: upstream and argument failures come back as
/// `Err(description)` so the agent can read them and carry on.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON Schema for the argument object.
    fn input_schema(&self) -> Value;
    async fn invoke(&self, args: &ToolArgs) -> Result<String, String>;
}

/// Tool schema for sending to LLM (OpenAI / Anthropic tool format)
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolSchema {
    pub name:         String,
    pub description:  String,
    pub input_schema: Value,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: BTreeMap::new() }
    }

    /// The full Chicago catalog, wired from one settings value.
    pub fn chicago(settings: &Settings) -> Result<Self, AgentError> {
        let geocoder = NominatimGeocoder::new(settings)
            .map_err(|e| AgentError::BuildError(e.to_string()))?;
        let client = OpenDataClient::new(settings)
            .map_err(|e| AgentError::BuildError(e.to_string()))?;
        let cap = settings.max_summary_chars;

        let violations = Arc::new(ViolationsAdapter::new(client.clone(), cap));

        let mut registry = Self::new();
        registry.register(GeocodeTool::new(Arc::new(geocoder)));
        registry.register(ProximityTool);
        registry.register(SearchTool::violations(violations.clone()));
        registry.register(ViolationDetailsTool::new(violations));
        registry.register(SearchTool::permits(Arc::new(PermitsAdapter::new(client.clone(), cap))));
        registry.register(SearchTool::food_inspections(Arc::new(FoodInspectionsAdapter::new(client.clone(), cap))));
        registry.register(SearchTool::murals(Arc::new(MuralsAdapter::new(client, cap))));
        Ok(registry)
    }

    /// Registers a tool under its own name, replacing any previous entry.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Execute a named tool with given arguments.
    /// Unknown names are reported as `Err`, like any other tool failure.
    pub async fn execute(&self, name: &str, args: &ToolArgs) -> Result<String, String> {
        let Some(tool) = self.tools.get(name) else {
            return Err(format!("Tool '{}' not found in registry", name));
        };
        tracing::info!(tool = name, "invoking tool");
        let result = tool.invoke(args).await;
        if let Err(e) = &result {
            tracing::warn!(tool = name, error = %e, "tool returned an error");
        }
        result
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Schemas in name order, for the tools array of an LLM request.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| ToolSchema {
            name:         t.name().to_string(),
            description:  t.description().to_string(),
            input_schema: t.input_schema(),
        }).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Reads an optional string argument; blank strings count as absent.
pub(crate) fn str_arg<'a>(args: &'a ToolArgs, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Reads a number that may have been sent as a JSON string.
pub(crate) fn f64_arg(args: &ToolArgs, key: &str) -> Option<f64> {
    match args.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
