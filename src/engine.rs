use std::sync::Arc;

use futures::future::join_all;
use tracing::Instrument;

use crate::error::AgentError;
use crate::llm::LlmCaller;
use crate::memory::Transcript;
use crate::tools::ToolRegistry;
use crate::trace::Trace;
use crate::types::{HistoryEntry, LlmResponse, Phase, ToolCall};

/// Drives one investigation: ask the LLM, run the tools it asks for, feed the
/// observations back, until it answers or the step limit is hit.
pub struct Investigator {
    transcript: Transcript,
    tools:      Arc<ToolRegistry>,
    llm:        Arc<dyn LlmCaller>,
    model:      String,
    max_steps:  usize,
    phase:      Phase,
    pending:    Vec<ToolCall>,
    observed:   Vec<HistoryEntry>,
    answer:     Option<String>,
    failure:    Option<AgentError>,
}

impl Investigator {
    /// Prefer `InvestigatorBuilder` for construction.
    pub fn new(
        transcript: Transcript,
        tools:      Arc<ToolRegistry>,
        llm:        Arc<dyn LlmCaller>,
        model:      impl Into<String>,
        max_steps:  usize,
    ) -> Self {
        Self {
            transcript,
            tools,
            llm,
            model: model.into(),
            max_steps,
            phase: Phase::Planning,
            pending: Vec::new(),
            observed: Vec::new(),
            answer: None,
            failure: None,
        }
    }

    /// Runs to completion. Returns the final answer or why there is none.
    pub async fn run(&mut self) -> Result<String, AgentError> {
        let span = tracing::info_span!("investigation", run_id = %self.transcript.run_id, model = %self.model);

        async {
            tracing::info!(query = %self.transcript.query, tools = self.tools.len(), "investigation started");
            let query = self.transcript.query.clone();
            self.transcript.log("Planning", "START", &query);

            while !self.phase.is_terminal() {
                self.step().await;
            }

            let usage = self.transcript.usage;
            tracing::info!(
                phase = %self.phase,
                steps = self.transcript.step,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "investigation finished"
            );
        }
        .instrument(span)
        .await;

        match (self.answer.clone(), self.failure.take()) {
            (Some(answer), _) => Ok(answer),
            (None, Some(err)) => Err(err),
            (None, None)      => Err(AgentError::AgentFailed(format!("stopped in phase {}", self.phase))),
        }
    }

    /// Executes a single phase and moves to the next one.
    pub async fn step(&mut self) {
        let next = match self.phase {
            Phase::Planning  => self.plan().await,
            Phase::Acting    => self.act().await,
            Phase::Observing => self.observe(),
            terminal         => terminal,
        };
        if next != self.phase {
            tracing::info!(from = %self.phase, to = %next, step = self.transcript.step, "transition");
        }
        self.phase = next;
    }

    async fn plan(&mut self) -> Phase {
        if self.transcript.step >= self.max_steps {
            tracing::error!(max_steps = self.max_steps, "step limit reached");
            self.transcript.log("Planning", "MAX_STEPS", &self.max_steps.to_string());
            return self.fail(AgentError::MaxSteps(self.max_steps));
        }
        self.transcript.step += 1;

        let response = self.llm
            .call(&self.transcript, &self.tools, &self.model)
            .await;

        match response {
            Ok(response) => {
                if let Some(usage) = response.usage() {
                    self.transcript.usage.add(usage);
                }
                match response {
                    LlmResponse::ToolCalls { calls, .. } if !calls.is_empty() => {
                        let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
                        self.transcript.log("Planning", "LLM_TOOL_CALLS", &names.join(", "));
                        self.pending = calls;
                        Phase::Acting
                    }
                    LlmResponse::ToolCalls { .. } => {
                        self.transcript.log("Planning", "LLM_EMPTY_TOOL_CALLS", "");
                        self.fail(AgentError::LlmError("tool call response with no calls".to_string()))
                    }
                    LlmResponse::FinalAnswer { content, .. } => {
                        self.transcript.log("Planning", "FINAL_ANSWER", &content.chars().take(200).collect::<String>());
                        self.answer = Some(content);
                        Phase::Done
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "LLM call failed");
                self.transcript.log("Planning", "LLM_ERROR", &e);
                self.fail(AgentError::LlmError(e))
            }
        }
    }

    /// All calls from one turn run concurrently; results keep the call order.
    async fn act(&mut self) -> Phase {
        let calls = std::mem::take(&mut self.pending);
        let step = self.transcript.step;
        let tools = &self.tools;

        let results = join_all(calls.into_iter().enumerate().map(|(i, call)| async move {
            let call_id = call.id.clone().unwrap_or_else(|| format!("call_{}_{}", step, i));
            tracing::debug!(tool = %call.name, call_id = %call_id, args = ?call.args, "dispatching tool call");
            let result = tools.execute(&call.name, &call.args).await;
            (call, call_id, result)
        }))
        .await;

        for (call, call_id, result) in results {
            let (observation, success) = match result {
                Ok(out)  => (format!("SUCCESS: {}", out), true),
                Err(err) => {
                    tracing::warn!(tool = %call.name, error = %err, "tool failed");
                    (format!("ERROR: {}", err), false)
                }
            };
            self.transcript.log("Acting", if success { "TOOL_SUCCESS" } else { "TOOL_FAILURE" }, &format!(
                "{} {}", call.name, observation.chars().take(200).collect::<String>()
            ));
            self.observed.push(HistoryEntry { step, tool: call, call_id, observation, success });
        }

        Phase::Observing
    }

    fn observe(&mut self) -> Phase {
        let entries = std::mem::take(&mut self.observed);
        let failed = entries.iter().filter(|e| !e.success).count();
        self.transcript.log("Observing", "OBSERVED", &format!("results={} failed={}", entries.len(), failed));
        self.transcript.history.extend(entries);
        Phase::Planning
    }

    fn fail(&mut self, err: AgentError) -> Phase {
        self.failure = Some(err);
        Phase::Failed
    }

    /// Returns a reference to the full execution trace.
    pub fn trace(&self) -> &Trace {
        &self.transcript.trace
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the current phase (useful for inspection after run).
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmCaller;
    use crate::tools::ProximityTool;
    use serde_json::json;
    use std::collections::HashMap;

    fn proximity_call() -> ToolCall {
        let args: HashMap<String, serde_json::Value> =
            serde_json::from_value(json!({ "latitude": 41.8958, "longitude": -87.6688, "radius_miles": 0.1 })).unwrap();
        ToolCall::new("get_proximity_to_coords", args)
    }

    fn investigator(script: Vec<LlmResponse>, max_steps: usize) -> Investigator {
        let mut tools = ToolRegistry::new();
        tools.register(ProximityTool);
        Investigator::new(
            Transcript::new("q"),
            Arc::new(tools),
            Arc::new(MockLlmCaller::new(script)),
            "llama3.1",
            max_steps,
        )
    }

    #[tokio::test]
    async fn test_phases_cycle_through_acting_and_observing() {
        let mut agent = investigator(vec![LlmResponse::tool(proximity_call()), LlmResponse::answer("done")], 5);

        agent.step().await;
        assert_eq!(agent.phase(), Phase::Acting);
        agent.step().await;
        assert_eq!(agent.phase(), Phase::Observing);
        assert!(agent.transcript().history.is_empty());
        agent.step().await;
        assert_eq!(agent.phase(), Phase::Planning);
        assert_eq!(agent.transcript().history.len(), 1);
        assert_eq!(agent.transcript().history[0].call_id, "call_1_0");
        assert!(agent.transcript().history[0].observation.starts_with("SUCCESS: {"));
    }

    #[tokio::test]
    async fn test_step_limit_fails_run() {
        let mut agent = investigator(vec![
            LlmResponse::tool(proximity_call()),
            LlmResponse::tool(proximity_call()),
            LlmResponse::tool(proximity_call()),
        ], 2);

        let err = agent.run().await.unwrap_err();
        assert!(matches!(err, AgentError::MaxSteps(2)));
        assert_eq!(agent.phase(), Phase::Failed);
        assert_eq!(agent.trace().for_event("MAX_STEPS").len(), 1);
    }

    #[tokio::test]
    async fn test_empty_tool_call_list_fails() {
        let mut agent = investigator(vec![LlmResponse::ToolCalls { calls: vec![], usage: None }], 5);
        let err = agent.run().await.unwrap_err();
        assert!(matches!(err, AgentError::LlmError(_)));
    }
}
