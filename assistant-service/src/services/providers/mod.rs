//! Chat-completion provider abstraction.
//!
//! The product analyzer and the `/ask` router talk to a hosted model through
//! [`ChatProvider`], so the HTTP client can be swapped for the scripted mock
//! in tests.

pub mod mock;
pub mod openai;

use crate::services::metrics;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::Timeout => "timeout",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::Api { .. } => "api_error",
            ProviderError::Network(_) => "network",
            ProviderError::InvalidResponse(_) => "invalid_response",
        }
    }

    /// Note shown to end users in place of a model answer.
    pub fn human_message(&self, vendor: &str) -> String {
        match self {
            ProviderError::Timeout => format!("Timeout mot {}.", vendor),
            ProviderError::RateLimited => format!("Rate limit hos {}.", vendor),
            ProviderError::Api { status, .. } => format!("{}-fel {}", vendor, status),
            ProviderError::NotConfigured(_) => format!("{} är inte konfigurerad.", vendor),
            ProviderError::Network(msg) | ProviderError::InvalidResponse(msg) => {
                if msg.trim().is_empty() {
                    format!("Okänt {}-fel", vendor)
                } else {
                    msg.clone()
                }
            }
        }
    }
}

/// A single chat-completion call: one system message and one user message
/// made of text plus optional images.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub system: String,
    pub user_text: String,
    /// `data:` or `https:` URLs sent as `image_url` parts.
    pub image_urls: Vec<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user_text: user_text.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_urls.push(url.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Trait for chat-completion backends (OpenAI, DeepSeek, mock).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Vendor name used in user-facing error notes.
    fn name(&self) -> &str;

    /// Send the request and return the first choice's text (empty when the
    /// model returned no content).
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError>;
}

/// Run `provider.complete` under `timeout`, recording latency and outcome
/// under the given call label.
pub async fn complete_within(
    provider: &dyn ChatProvider,
    request: &ChatRequest,
    timeout: Duration,
    call: &str,
) -> Result<String, ProviderError> {
    let started = Instant::now();

    let result = match tokio::time::timeout(timeout, provider.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout),
    };

    let elapsed = started.elapsed().as_secs_f64();
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::record_provider_call(provider.name(), call, outcome, elapsed);

    match &result {
        Ok(text) => tracing::debug!(
            provider = provider.name(),
            call,
            elapsed_secs = elapsed,
            reply_len = text.len(),
            "Chat completion finished"
        ),
        Err(e) => tracing::warn!(
            provider = provider.name(),
            call,
            elapsed_secs = elapsed,
            error = %e,
            "Chat completion failed"
        ),
    }

    result
}
