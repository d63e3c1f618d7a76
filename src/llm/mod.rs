use crate::config::LlmSettings;
use crate::error::Result;
use crate::utils::with_retry;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// OpenAI-compatible chat-completion client
pub mod openai;

pub use openai::ChatCompletionClient;

/// A chat-completion backend
///
/// Implementations send `prompt` as a single user message and return the
/// first choice's text verbatim. They never retry on their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider identifier, for logs and diagnostics
    fn provider(&self) -> &'static str;
    /// Requests one completion for `prompt`
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Retry policy wrapped around another client
///
/// Only transient failures are retried (timeouts, rate limits, 5xx, transport errors).
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    max_attempts: u32,
    delay: Duration,
}

impl RetryingClient {
    /// Wraps `inner`, allowing up to `max_attempts` calls per completion
    pub fn new(inner: Arc<dyn LlmClient>, max_attempts: u32, delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

#[async_trait]
impl LlmClient for RetryingClient {
    fn provider(&self) -> &'static str {
        self.inner.provider()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        with_retry(
            || self.inner.complete(prompt),
            self.max_attempts,
            self.delay,
            |e| {
                let retry = e.is_transient();
                if retry {
                    info!(provider = self.inner.provider(), "Retrying completion after: {}", e);
                }
                retry
            },
        )
        .await
    }
}

/// Builds the configured client, wrapped in a retry policy when more than one attempt is allowed
pub fn create_client(settings: &LlmSettings) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = Arc::new(ChatCompletionClient::new(settings)?);
    if settings.max_attempts > 1 {
        Ok(Arc::new(RetryingClient::new(
            client,
            settings.max_attempts,
            settings.retry_delay,
        )))
    } else {
        Ok(client)
    }
}
