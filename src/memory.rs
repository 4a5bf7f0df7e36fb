use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::trace::{Trace, TraceEntry};
use crate::types::{HistoryEntry, TokenUsage};

/// Everything the LLM needs to see on the next call, plus the run's trace.
#[derive(Debug)]
pub struct Transcript {
    /// Identifies this run in logs
    pub run_id:        Uuid,
    /// The user's question
    pub query:         String,
    /// Sent ahead of every LLM call
    pub system_prompt: String,
    /// Current step number (incremented at the start of each Planning cycle)
    pub step:          usize,
    /// Completed tool calls and their observations, in order
    pub history:       Vec<HistoryEntry>,
    pub usage:         TokenUsage,
    pub trace:         Trace,
}

impl Transcript {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            run_id:        Uuid::new_v4(),
            query:         query.into(),
            system_prompt: String::new(),
            step:          0,
            history:       Vec::new(),
            usage:         TokenUsage::default(),
            trace:         Trace::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Records an event into the trace log.
    pub fn log(&mut self, phase: &str, event: &str, data: &str) {
        tracing::debug!(phase, event, data, step = self.step, "investigation trace");
        self.trace.record(TraceEntry {
            step:      self.step,
            phase:     phase.to_string(),
            event:     event.to_string(),
            data:      data.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// History split into runs of entries that share a step; each run is one
    /// assistant turn followed by its tool results.
    pub fn turns(&self) -> Vec<&[HistoryEntry]> {
        self.history
            .chunk_by(|a, b| a.step == b.step)
            .collect()
    }

    /// OpenAI chat format: system, user, then per turn an assistant message
    /// carrying all its tool calls followed by one `tool` message per result.
    pub fn openai_messages(&self) -> Vec<serde_json::Value> {
        let mut messages = Vec::new();

        if !self.system_prompt.is_empty() {
            messages.push(json!({ "role": "system", "content": self.system_prompt }));
        }
        messages.push(json!({ "role": "user", "content": &self.query }));

        for turn in self.turns() {
            let calls: Vec<_> = turn.iter().map(|entry| json!({
                "id":   entry.call_id,
                "type": "function",
                "function": {
                    "name":      entry.tool.name,
                    "arguments": serde_json::to_string(&entry.tool.args).unwrap_or_default()
                }
            })).collect();

            messages.push(json!({ "role": "assistant", "content": null, "tool_calls": calls }));
            messages.extend(turn.iter().map(|entry| json!({
                "role":         "tool",
                "tool_call_id": entry.call_id,
                "content":      entry.observation
            })));
        }

        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;
    use std::collections::HashMap;

    fn entry(step: usize, name: &str, id: &str) -> HistoryEntry {
        HistoryEntry {
            step,
            tool:        ToolCall::new(name, HashMap::new()),
            call_id:     id.to_string(),
            observation: format!("SUCCESS: {name} done"),
            success:     true,
        }
    }

    #[test]
    fn test_turns_group_by_step() {
        let mut t = Transcript::new("q");
        t.history = vec![entry(1, "a", "1"), entry(2, "b", "2"), entry(2, "c", "3"), entry(3, "d", "4")];
        let sizes: Vec<usize> = t.turns().iter().map(|turn| turn.len()).collect();
        assert_eq!(sizes, vec![1, 2, 1]);
    }

    #[test]
    fn test_openai_messages_layout() {
        let mut t = Transcript::new("violations near 1601 W CHICAGO AVE?").with_system_prompt("be brief");
        t.history = vec![entry(1, "geocode_address", "call_1"), entry(1, "search_murals", "call_2")];

        let messages = t.openai_messages();
        let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool", "tool"]);
        assert_eq!(messages[2]["tool_calls"].as_array().unwrap().len(), 2);
        assert_eq!(messages[4]["tool_call_id"], "call_2");
    }

    #[test]
    fn test_no_system_message_when_prompt_empty() {
        let t = Transcript::new("q");
        let messages = t.openai_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }
}
