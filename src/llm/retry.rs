use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::memory::Transcript;
use crate::tools::ToolRegistry;
use crate::types::LlmResponse;

const MAX_WAIT: Duration = Duration::from_secs(60);
const RATE_LIMIT_WAIT: Duration = Duration::from_secs(5);

/// A wrapper around any `LlmCaller` that retries transient failures
/// with exponential back-off.
pub struct RetryingLlmCaller {
    inner:       Arc<dyn super::LlmCaller>,
    max_retries: u32,
    base_wait:   Duration,
}

impl RetryingLlmCaller {
    pub fn new(inner: Arc<dyn super::LlmCaller>, max_retries: u32) -> Self {
        Self { inner, max_retries, base_wait: Duration::from_secs(1) }
    }

    pub fn with_base_wait(mut self, wait: Duration) -> Self {
        self.base_wait = wait; self
    }

    fn is_auth_error(err: &str) -> bool {
        let lower = err.to_lowercase();
        lower.contains("401")
            || lower.contains("403")
            || lower.contains("authentication")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
            || lower.contains("invalid api key")
            || lower.contains("not set")
    }

    fn is_rate_limit_error(err: &str) -> bool {
        let lower = err.to_lowercase();
        lower.contains("429")
            || lower.contains("rate limit")
            || lower.contains("too many requests")
            || lower.contains("overloaded")
    }

    fn wait_for(&self, attempt: u32, err: &str) -> Duration {
        let base = if Self::is_rate_limit_error(err) {
            RATE_LIMIT_WAIT.max(self.base_wait)
        } else {
            self.base_wait
        };
        base.saturating_mul(1 << attempt.min(16)).min(MAX_WAIT)
    }
}

#[async_trait]
impl super::LlmCaller for RetryingLlmCaller {
    async fn call(
        &self,
        transcript: &Transcript,
        tools:      &ToolRegistry,
        model:      &str,
    ) -> Result<LlmResponse, String> {
        let mut last_err = String::new();
        let mut rate_limited = false;

        for attempt in 0..=self.max_retries {
            match self.inner.call(transcript, tools, model).await {
                Ok(resp) => return Ok(resp),
                Err(e) if Self::is_auth_error(&e) => {
                    tracing::error!(error = %e, "LLM auth error, not retrying");
                    return Err(e);
                }
                Err(e) => {
                    rate_limited |= Self::is_rate_limit_error(&e);

                    if attempt < self.max_retries {
                        let wait = self.wait_for(attempt, &e);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max     = self.max_retries,
                            wait_ms = wait.as_millis() as u64,
                            error   = %e,
                            "LLM transient error, retrying"
                        );
                        tokio::time::sleep(wait).await;
                    }
                    last_err = e;
                }
            }
        }

        let prefix = if rate_limited {
            "LLM RATE LIMIT EXCEEDED"
        } else {
            "LLM failed"
        };

        Err(format!(
            "{} after {} retries, last error: {}",
            prefix, self.max_retries, last_err
        ))
    }
}
