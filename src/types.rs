use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where the investigation loop currently is.
///
/// ```text
/// Planning ──tool calls──▶ Acting ──▶ Observing ──▶ Planning
///    │
///    ├──final answer──▶ Done
///    └──LLM error / step limit──▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Planning,
    Acting,
    Observing,
    Done,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Planning  => "Planning",
            Phase::Acting    => "Acting",
            Phase::Observing => "Observing",
            Phase::Done      => "Done",
            Phase::Failed    => "Failed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation requested by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub args: HashMap<String, serde_json::Value>,
    pub id:   Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: HashMap<String, serde_json::Value>) -> Self {
        Self { name: name.into(), args, id: None }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into()); self
    }
}

/// A completed tool invocation stored in history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub step:        usize,
    pub tool:        ToolCall,
    /// Provider-facing id; falls back to a generated one when the LLM sent none.
    pub call_id:     String,
    /// `"SUCCESS: ..."` or `"ERROR: ..."`
    pub observation: String,
    pub success:     bool,
}

/// Tracks token usage for a single LLM call or an entire session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens:  u32,
    pub output_tokens: u32,
    pub total_tokens:  u32,
}

impl TokenUsage {
    pub fn new(input: u32, output: u32) -> Self {
        Self {
            input_tokens:  input,
            output_tokens: output,
            total_tokens:  input + output,
        }
    }

    /// Accumulate usage from another call
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// What the LLM can return. Always one of these two variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LlmResponse {
    /// One or more tools to run before asking again
    ToolCalls {
        calls: Vec<ToolCall>,
        usage: Option<TokenUsage>,
    },
    /// LLM produced a final answer; the run is complete
    FinalAnswer {
        content: String,
        usage:   Option<TokenUsage>,
    },
}

impl LlmResponse {
    pub fn tool(call: ToolCall) -> Self {
        LlmResponse::ToolCalls { calls: vec![call], usage: None }
    }

    pub fn answer(content: impl Into<String>) -> Self {
        LlmResponse::FinalAnswer { content: content.into(), usage: None }
    }

    pub fn usage(&self) -> Option<TokenUsage> {
        match self {
            LlmResponse::ToolCalls { usage, .. } | LlmResponse::FinalAnswer { usage, .. } => *usage,
        }
    }
}
