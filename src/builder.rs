use std::sync::Arc;

use crate::config::Settings;
use crate::engine::Investigator;
use crate::error::AgentError;
use crate::llm::LlmCaller;
use crate::memory::Transcript;
use crate::prompt;
use crate::tools::{Tool, ToolRegistry};

pub const DEFAULT_MAX_STEPS: usize = 15;

pub struct InvestigatorBuilder {
    query:         String,
    system_prompt: Option<String>,
    model:         Option<String>,
    tools:         ToolRegistry,
    llm:           Option<Arc<dyn LlmCaller>>,
    max_steps:     usize,
}

impl InvestigatorBuilder {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query:         query.into(),
            system_prompt: None,
            model:         None,
            tools:         ToolRegistry::new(),
            llm:           None,
            max_steps:     DEFAULT_MAX_STEPS,
        }
    }

    /// Overrides the prompt generated from the registered tools.
    pub fn system_prompt(mut self, p: impl Into<String>) -> Self {
        self.system_prompt = Some(p.into()); self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into()); self
    }

    pub fn llm(mut self, llm: Arc<dyn LlmCaller>) -> Self {
        self.llm = Some(llm); self
    }

    /// Replaces the registry wholesale.
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools; self
    }

    pub fn tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.register(tool); self
    }

    pub fn max_steps(mut self, n: usize) -> Self {
        self.max_steps = n; self
    }

    /// Step limit from settings.
    pub fn settings(self, settings: &Settings) -> Self {
        self.max_steps(settings.max_steps)
    }

    pub fn build(self) -> Result<Investigator, AgentError> {
        let llm = self.llm
            .ok_or_else(|| AgentError::BuildError("LLM caller is required".to_string()))?;
        let model = self.model
            .ok_or_else(|| AgentError::BuildError("model is required".to_string()))?;
        if self.query.trim().is_empty() {
            return Err(AgentError::BuildError("query is empty".to_string()));
        }
        if self.max_steps == 0 {
            return Err(AgentError::BuildError("max_steps must be at least 1".to_string()));
        }

        let system_prompt = self.system_prompt
            .unwrap_or_else(|| prompt::system_prompt(&self.tools));
        let transcript = Transcript::new(self.query).with_system_prompt(system_prompt);

        Ok(Investigator::new(transcript, Arc::new(self.tools), llm, model, self.max_steps))
    }
}
