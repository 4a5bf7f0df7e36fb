use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::Settings;
use crate::llm::LlmCaller;
use crate::memory::Transcript;
use crate::tools::ToolRegistry;
use crate::types::{LlmResponse, TokenUsage, ToolCall};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

// ── Anthropic request types ──────────────────────────────

#[derive(serde::Serialize)]
struct AnthropicRequest {
    model:      String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system:     Option<String>,
    tools:      Vec<AnthropicToolDef>,
    messages:   Vec<AnthropicMessage>,
}

#[derive(serde::Serialize)]
struct AnthropicToolDef {
    name:         String,
    description:  String,
    input_schema: Value,
}

#[derive(serde::Serialize, Debug, Clone)]
struct AnthropicMessage {
    role:    &'static str,
    content: Value,   // string or array of content blocks
}

// ── Anthropic response types ─────────────────────────────

#[derive(serde::Deserialize, Debug)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage:   AnthropicUsage,
}

#[derive(serde::Deserialize, Debug)]
struct AnthropicUsage {
    input_tokens:  u32,
    output_tokens: u32,
}

#[derive(serde::Deserialize, Debug)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        id:    String,
        name:  String,
        input: Value,
    },

    #[serde(other)]
    Other,
}

// ── Caller ───────────────────────────────────────────────

/// Claude over the Messages API.
pub struct AnthropicCaller {
    client:   reqwest::Client,
    api_key:  String,
    api_base: String,
}

impl AnthropicCaller {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client:   reqwest::Client::new(),
            api_key:  api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        let key = settings.anthropic_api_key.clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or("ANTHROPIC_API_KEY not set")?;
        Ok(Self::new(key, settings.anthropic_base_url.clone()))
    }

    fn build_tool_defs(tools: &ToolRegistry) -> Vec<AnthropicToolDef> {
        tools.schemas().into_iter().map(|s| AnthropicToolDef {
            name:         s.name,
            description:  s.description,
            input_schema: s.input_schema,
        }).collect()
    }

    /// User query, then per turn an assistant message of `tool_use` blocks
    /// answered by a single user message of matching `tool_result` blocks.
    fn build_messages(transcript: &Transcript) -> Vec<AnthropicMessage> {
        let mut messages = vec![AnthropicMessage {
            role:    "user",
            content: Value::String(transcript.query.clone()),
        }];

        for turn in transcript.turns() {
            let uses: Vec<Value> = turn.iter().map(|entry| json!({
                "type":  "tool_use",
                "id":    entry.call_id,
                "name":  entry.tool.name,
                "input": entry.tool.args,
            })).collect();
            let results: Vec<Value> = turn.iter().map(|entry| json!({
                "type":        "tool_result",
                "tool_use_id": entry.call_id,
                "content":     entry.observation,
                "is_error":    !entry.success,
            })).collect();

            messages.push(AnthropicMessage { role: "assistant", content: Value::Array(uses) });
            messages.push(AnthropicMessage { role: "user", content: Value::Array(results) });
        }

        messages
    }

    /// Every `tool_use` block becomes a call; only text means a final answer.
    fn parse_response(parsed: AnthropicResponse) -> Result<LlmResponse, String> {
        let usage = Some(TokenUsage::new(parsed.usage.input_tokens, parsed.usage.output_tokens));
        let mut calls = Vec::new();
        let mut text = Vec::new();

        for block in parsed.content {
            match block {
                AnthropicContentBlock::ToolUse { id, name, input } => {
                    let args: HashMap<String, Value> = serde_json::from_value(input)
                        .map_err(|e| format!("Invalid tool args: {}", e))?;
                    calls.push(ToolCall::new(name, args).with_id(id));
                }
                AnthropicContentBlock::Text { text: t } => text.push(t),
                AnthropicContentBlock::Other => {}
            }
        }

        if !calls.is_empty() {
            return Ok(LlmResponse::ToolCalls { calls, usage });
        }
        if text.is_empty() {
            return Err("Anthropic returned empty content".to_string());
        }
        Ok(LlmResponse::FinalAnswer { content: text.join("\n"), usage })
    }
}

#[async_trait]
impl LlmCaller for AnthropicCaller {
    async fn call(
        &self,
        transcript: &Transcript,
        tools:      &ToolRegistry,
        model:      &str,
    ) -> Result<LlmResponse, String> {
        let system = if transcript.system_prompt.is_empty() {
            None
        } else {
            Some(transcript.system_prompt.clone())
        };

        let body = AnthropicRequest {
            model:      model.to_string(),
            max_tokens: MAX_TOKENS,
            system,
            tools:      Self::build_tool_defs(tools),
            messages:   Self::build_messages(transcript),
        };

        let response = self.client
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key",         &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type",      "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body   = response.text().await.unwrap_or_default();
            return Err(format!("Anthropic API error {}: {}", status, body));
        }

        let parsed: AnthropicResponse = response.json()
            .await
            .map_err(|e| format!("Failed to parse Anthropic response: {}", e))?;

        Self::parse_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HistoryEntry;
    use mockito::Matcher;

    fn transcript() -> Transcript {
        let mut t = Transcript::new("Are there murals near 1751 W AUGUSTA BLVD?").with_system_prompt("be brief");
        t.history.push(HistoryEntry {
            step:        1,
            tool:        ToolCall::new("geocode_address", HashMap::new()),
            call_id:     "toolu_1".into(),
            observation: "SUCCESS: {\"latitude\":41.9,\"longitude\":-87.67}".into(),
            success:     true,
        });
        t
    }

    #[test]
    fn test_tool_results_follow_tool_uses() {
        let messages = AnthropicCaller::build_messages(&transcript());
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(messages[1].content[0]["type"], "tool_use");
        assert_eq!(messages[2].content[0]["tool_use_id"], "toolu_1");
        assert_eq!(messages[2].content[0]["is_error"], false);
    }

    #[tokio::test]
    async fn test_collects_every_tool_use_block() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({ "model": "claude-haiku-4-5", "system": "be brief" })))
            .with_status(200)
            .with_body(json!({
                "content": [
                    { "type": "text", "text": "Looking that up." },
                    { "type": "tool_use", "id": "toolu_2", "name": "search_murals", "input": { "location": {} } },
                    { "type": "tool_use", "id": "toolu_3", "name": "search_violations", "input": {} }
                ],
                "stop_reason": "tool_use",
                "usage": { "input_tokens": 120, "output_tokens": 30 }
            }).to_string())
            .create_async()
            .await;

        let caller = AnthropicCaller::new("test-key", server.url());
        let response = caller.call(&transcript(), &ToolRegistry::new(), "claude-haiku-4-5").await.unwrap();
        mock.assert_async().await;

        match response {
            LlmResponse::ToolCalls { calls, usage } => {
                let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["search_murals", "search_violations"]);
                assert_eq!(calls[0].id.as_deref(), Some("toolu_2"));
                assert_eq!(usage, Some(TokenUsage::new(120, 30)));
            }
            other => panic!("expected tool calls, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_text_only_is_final_answer() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"No murals found."}],"usage":{"input_tokens":1,"output_tokens":1}}"#)
            .create_async()
            .await;

        let caller = AnthropicCaller::new("k", server.url());
        let response = caller.call(&transcript(), &ToolRegistry::new(), "m").await.unwrap();
        assert!(matches!(response, LlmResponse::FinalAnswer { ref content, .. } if content == "No murals found."));
    }

    #[tokio::test]
    async fn test_http_error_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/v1/messages")
            .with_status(401)
            .with_body("invalid x-api-key")
            .create_async()
            .await;

        let caller = AnthropicCaller::new("bad", server.url());
        let err = caller.call(&transcript(), &ToolRegistry::new(), "m").await.unwrap_err();
        assert!(err.contains("401"), "{err}");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let settings = Settings::default();
        assert!(AnthropicCaller::from_settings(&settings).is_err());
    }
}
