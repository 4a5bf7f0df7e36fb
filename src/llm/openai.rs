use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionMessageToolCall,
        ChatCompletionRequestMessage,
        ChatCompletionTool,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;

use crate::config::Settings;
use crate::llm::LlmCaller;
use crate::memory::Transcript;
use crate::tools::ToolRegistry;
use crate::types::{LlmResponse, TokenUsage, ToolCall};

/// Ollama ignores the key but the client insists on one.
const OLLAMA_API_KEY: &str = "ollama";

/// Any OpenAI-compatible chat completions endpoint.
pub struct OpenAiCaller {
    client: Client<OpenAIConfig>,
}

impl OpenAiCaller {
    /// Custom base URL, e.g. "http://localhost:11434/v1" for Ollama
    pub fn with_base_url(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        Self { client: Client::with_config(config) }
    }

    /// The local Ollama server from settings.
    pub fn ollama(settings: &Settings) -> Self {
        Self::with_base_url(settings.ollama_base_url.clone(), OLLAMA_API_KEY)
    }

    /// Convert our ToolSchema into async-openai's ChatCompletionTool type
    fn build_tools(tools: &ToolRegistry) -> Result<Vec<ChatCompletionTool>, String> {
        tools.schemas().into_iter().map(|schema| {
            serde_json::from_value(json!({
                "type": "function",
                "function": {
                    "name":        schema.name,
                    "description": schema.description,
                    "parameters":  schema.input_schema
                }
            }))
            .map_err(|e| format!("Failed to build tool '{}': {}", schema.name, e))
        }).collect()
    }

    fn parse_tool_call(tc: &ChatCompletionMessageToolCall) -> Result<ToolCall, String> {
        let args: HashMap<String, serde_json::Value> = if tc.function.arguments.trim().is_empty() {
            HashMap::new()
        } else {
            serde_json::from_str(&tc.function.arguments)
                .map_err(|e| format!("Failed to parse tool args: {}", e))?
        };
        Ok(ToolCall::new(tc.function.name.clone(), args).with_id(tc.id.clone()))
    }
}

#[async_trait]
impl LlmCaller for OpenAiCaller {
    async fn call(
        &self,
        transcript: &Transcript,
        tools:      &ToolRegistry,
        model:      &str,
    ) -> Result<LlmResponse, String> {
        let messages: Vec<ChatCompletionRequestMessage> =
            serde_json::from_value(serde_json::Value::Array(transcript.openai_messages()))
                .map_err(|e| format!("Failed to build messages: {}", e))?;

        let oai_tools = Self::build_tools(tools)?;

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(model).messages(messages);

        if !oai_tools.is_empty() {
            request_builder.tools(oai_tools);
        }

        let request = request_builder.build()
            .map_err(|e| format!("Failed to build request: {}", e))?;

        let response = self.client.chat()
            .create(request)
            .await
            .map_err(|e| format!("OpenAI API error: {}", e))?;

        let usage = response.usage.map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        let choice = response.choices.into_iter().next()
            .ok_or("Empty response from OpenAI")?;

        let message = choice.message;

        // Tool calls take priority over text content
        if let Some(tool_calls) = message.tool_calls.filter(|calls| !calls.is_empty()) {
            let calls = tool_calls.iter()
                .map(Self::parse_tool_call)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(LlmResponse::ToolCalls { calls, usage });
        }

        let content = message.content
            .ok_or("No content in OpenAI response")?;

        Ok(LlmResponse::FinalAnswer { content, usage })
    }
}
