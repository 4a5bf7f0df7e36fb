//! Integration tests for the investigation loop.
//!
//! All tests use `MockLlmCaller` and in-process tools, so no network calls are made.
//! Run with: `cargo test`

use investigator::llm::{LlmCaller, MockLlmCaller, RetryingLlmCaller};
use investigator::tools::{ProximityTool, Tool, ToolArgs};
use investigator::{AgentError, InvestigatorBuilder, LlmResponse, Phase, TokenUsage, ToolCall};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Test helpers
// ─────────────────────────────────────────────────────────────────────────────

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str { "echo" }
    fn description(&self) -> &str { "Echoes its 'text' argument" }
    fn input_schema(&self) -> Value {
        json!({ "type": "object", "properties": { "text": { "type": "string" } } })
    }
    async fn invoke(&self, args: &ToolArgs) -> Result<String, String> {
        args.get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "text is required".to_string())
    }
}

fn call(name: &str, args: Value) -> ToolCall {
    let args: HashMap<String, Value> = serde_json::from_value(args).unwrap();
    ToolCall::new(name, args)
}

fn builder(llm: Arc<dyn LlmCaller>) -> InvestigatorBuilder {
    InvestigatorBuilder::new("What is near 1601 W CHICAGO AVE?")
        .llm(llm)
        .model("llama3.1")
        .tool(EchoTool)
        .tool(ProximityTool)
}

// ─────────────────────────────────────────────────────────────────────────────
// Happy path
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_immediate_final_answer() {
    let llm = Arc::new(MockLlmCaller::new(vec![LlmResponse::answer("Nothing to report.")]));
    let mut agent = builder(llm.clone()).build().unwrap();

    let answer = agent.run().await.unwrap();
    assert_eq!(answer, "Nothing to report.");
    assert_eq!(agent.phase(), Phase::Done);
    assert_eq!(llm.call_count(), 1);
    assert_eq!(llm.model_for_call(0).as_deref(), Some("llama3.1"));
}

#[tokio::test]
async fn test_tool_then_answer() {
    let llm = Arc::new(MockLlmCaller::new(vec![
        LlmResponse::tool(call("echo", json!({ "text": "hello" })).with_id("call_a")),
        LlmResponse::answer("The tool said hello."),
    ]));
    let mut agent = builder(llm.clone()).build().unwrap();

    let answer = agent.run().await.unwrap();
    assert_eq!(answer, "The tool said hello.");

    let history = &agent.transcript().history;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].call_id, "call_a");
    assert_eq!(history[0].observation, "SUCCESS: hello");
    assert!(history[0].success);

    // The second LLM call saw the observation
    assert_eq!(llm.history_for_call(0), Some(0));
    assert_eq!(llm.history_for_call(1), Some(1));
}

#[tokio::test]
async fn test_usage_is_accumulated() {
    let llm = Arc::new(MockLlmCaller::new(vec![
        LlmResponse::ToolCalls {
            calls: vec![call("echo", json!({ "text": "x" }))],
            usage: Some(TokenUsage::new(100, 20)),
        },
        LlmResponse::FinalAnswer { content: "done".into(), usage: Some(TokenUsage::new(150, 30)) },
    ]));
    let mut agent = builder(llm).build().unwrap();
    agent.run().await.unwrap();

    assert_eq!(agent.transcript().usage, TokenUsage::new(250, 50));
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool failures are observations, not run failures
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unknown_tool_is_recoverable() {
    let llm = Arc::new(MockLlmCaller::new(vec![
        LlmResponse::tool(call("search_everything", json!({}))),
        LlmResponse::answer("I could not find that tool."),
    ]));
    let mut agent = builder(llm).build().unwrap();

    let answer = agent.run().await.unwrap();
    assert_eq!(answer, "I could not find that tool.");

    let entry = &agent.transcript().history[0];
    assert!(!entry.success);
    assert_eq!(entry.observation, "ERROR: Tool 'search_everything' not found in registry");
    assert_eq!(agent.trace().for_event("TOOL_FAILURE").len(), 1);
}

#[tokio::test]
async fn test_invalid_radius_is_reported_to_llm() {
    let llm = Arc::new(MockLlmCaller::new(vec![
        LlmResponse::tool(call("get_proximity_to_coords", json!({ "latitude": 41.9, "longitude": -87.6, "radius_miles": 0 }))),
        LlmResponse::answer("The radius was invalid."),
    ]));
    let mut agent = builder(llm).build().unwrap();
    agent.run().await.unwrap();

    let entry = &agent.transcript().history[0];
    assert!(entry.observation.starts_with("ERROR: Invalid radius"), "{}", entry.observation);
}

// ─────────────────────────────────────────────────────────────────────────────
// Terminal failures
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_max_steps_exceeded() {
    let looping: Vec<LlmResponse> = (0..10)
        .map(|_| LlmResponse::tool(call("echo", json!({ "text": "again" }))))
        .collect();
    let llm = Arc::new(MockLlmCaller::new(looping));
    let mut agent = builder(llm.clone()).max_steps(3).build().unwrap();

    let err = agent.run().await.unwrap_err();
    assert!(matches!(err, AgentError::MaxSteps(3)), "{err}");
    assert_eq!(agent.phase(), Phase::Failed);
    assert_eq!(llm.call_count(), 3);
    assert_eq!(agent.transcript().history.len(), 3);
}

#[tokio::test]
async fn test_llm_error_fails_run() {
    let llm = Arc::new(MockLlmCaller::scripted(vec![Err("Anthropic API error 401: bad key".into())]));
    let mut agent = builder(llm).build().unwrap();

    let err = agent.run().await.unwrap_err();
    assert!(matches!(err, AgentError::LlmError(ref e) if e.contains("401")));
    assert_eq!(agent.trace().for_event("LLM_ERROR").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retrying_caller_inside_loop() {
    let inner = Arc::new(MockLlmCaller::scripted(vec![
        Err("Network error: connection reset".into()),
        Ok(LlmResponse::answer("Recovered.")),
    ]));
    let llm = Arc::new(RetryingLlmCaller::new(inner.clone(), 2));
    let mut agent = builder(llm).build().unwrap();

    assert_eq!(agent.run().await.unwrap(), "Recovered.");
    assert_eq!(inner.call_count(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Trace
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_trace_records_each_phase() {
    let llm = Arc::new(MockLlmCaller::new(vec![
        LlmResponse::tool(call("echo", json!({ "text": "a" }))),
        LlmResponse::answer("done"),
    ]));
    let mut agent = builder(llm).build().unwrap();
    agent.run().await.unwrap();

    let trace = agent.trace();
    assert_eq!(trace.for_event("START").len(), 1);
    assert_eq!(trace.for_event("LLM_TOOL_CALLS").len(), 1);
    assert_eq!(trace.for_event("TOOL_SUCCESS").len(), 1);
    assert_eq!(trace.for_event("OBSERVED").len(), 1);
    assert_eq!(trace.for_event("FINAL_ANSWER").len(), 1);
    assert!(trace.to_json().contains("\"phase\": \"Observing\""));
}
