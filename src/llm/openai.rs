//! OpenAI-compatible chat-completion client
//!
//! Works with OpenAI, Groq and any other API that speaks the
//! `/chat/completions` wire format.

use super::LlmClient;
use crate::config::LlmSettings;
use crate::error::{AnalyzerError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Single-shot chat-completion client
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    provider: &'static str,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionClient {
    /// Creates a client from the LLM settings
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| AnalyzerError::Config("LLM API key is not configured".into()))?;

        let client = Client::builder()
            .build()
            .map_err(|e| AnalyzerError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            provider: settings.provider.as_str(),
            api_key,
            base_url: settings.base_url().to_string(),
            model: settings.model().to_string(),
            temperature: settings.temperature,
            timeout: settings.timeout,
        })
    }

    /// Model identifier sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            // The body is not forwarded: providers echo key fragments in auth errors.
            warn!(provider = %self.provider, status = status.as_u16(), "Completion request rejected");
            return Err(status_error(status));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::upstream(format!("malformed completion response: {}", e.without_url())))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| AnalyzerError::upstream("completion response contained no choices"))
    }

    fn transport_error(&self, e: reqwest::Error) -> AnalyzerError {
        if e.is_timeout() {
            return AnalyzerError::Timeout(format!("{} completion request", self.provider));
        }
        warn!(provider = %self.provider, "Completion request failed: {}", e);
        AnalyzerError::transient_upstream(format!(
            "could not reach {}: {}",
            self.provider,
            e.without_url()
        ))
    }
}

fn status_error(status: StatusCode) -> AnalyzerError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AnalyzerError::upstream(format!("authentication with the provider failed (HTTP {})", status.as_u16()))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            AnalyzerError::transient_upstream("provider rate limit exceeded (HTTP 429)")
        }
        s if s.is_server_error() => {
            AnalyzerError::transient_upstream(format!("provider unavailable (HTTP {})", s.as_u16()))
        }
        s => AnalyzerError::upstream(format!("provider rejected the request (HTTP {})", s.as_u16())),
    }
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    fn provider(&self) -> &'static str {
        self.provider
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(provider = %self.provider, model = %self.model, chars = prompt.len(), "Requesting completion");
        match tokio::time::timeout(self.timeout, self.send(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(AnalyzerError::Timeout(format!(
                "{} completion exceeded {:?}",
                self.provider, self.timeout
            ))),
        }
    }
}
