use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmCaller;
use crate::memory::Transcript;
use crate::tools::ToolRegistry;
use crate::types::LlmResponse;

/// Replays a fixed script of responses, one per call.
pub struct MockLlmCaller {
    responses: Mutex<VecDeque<Result<LlmResponse, String>>>,
    call_log:  Mutex<Vec<(String, usize)>>,  // (model, history length seen)
}

impl MockLlmCaller {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    /// Like `new`, but individual calls may fail.
    pub fn scripted(responses: Vec<Result<LlmResponse, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            call_log:  Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of times call() was invoked
    pub fn call_count(&self) -> usize {
        self.call_log.lock().map(|log| log.len()).unwrap_or(0)
    }

    /// Returns the model string passed to the Nth call (0-indexed)
    pub fn model_for_call(&self, n: usize) -> Option<String> {
        self.call_log.lock().ok()?
            .get(n)
            .map(|(model, _)| model.clone())
    }

    /// Number of history entries the Nth call could see
    pub fn history_for_call(&self, n: usize) -> Option<usize> {
        self.call_log.lock().ok()?
            .get(n)
            .map(|(_, seen)| *seen)
    }
}

#[async_trait]
impl LlmCaller for MockLlmCaller {
    async fn call(
        &self,
        transcript: &Transcript,
        _tools:     &ToolRegistry,
        model:      &str,
    ) -> Result<LlmResponse, String> {
        self.call_log.lock()
            .map_err(|e| e.to_string())?
            .push((model.to_string(), transcript.history.len()));

        self.responses.lock()
            .map_err(|e| e.to_string())?
            .pop_front()
            .unwrap_or_else(|| Err("MockLlmCaller: no more programmed responses".to_string()))
    }
}
