use crate::memory::Transcript;
use crate::tools::ToolRegistry;
use crate::types::LlmResponse;
use async_trait::async_trait;

mod openai;
mod anthropic;
mod mock;
mod retry;

pub use openai::OpenAiCaller;
pub use anthropic::AnthropicCaller;
pub use mock::MockLlmCaller;
pub use retry::RetryingLlmCaller;

/// The single interface between the investigation loop and any LLM provider.
///
/// # Contract
/// - Returns Ok(LlmResponse) on any valid LLM interaction
/// - Returns Err(String) ONLY for unrecoverable failures:
///   - Network failure
///   - Authentication failure
///   - Response unparseable as LlmResponse
/// - MUST send the tool schemas from `tools.schemas()` on every call
/// - MUST rebuild the conversation from the transcript; callers keep no state
#[async_trait]
pub trait LlmCaller: Send + Sync {
    async fn call(
        &self,
        transcript: &Transcript,
        tools:      &ToolRegistry,
        model:      &str,
    ) -> Result<LlmResponse, String>;
}
