//! OpenAI-compatible chat-completion provider.
//!
//! Speaks the `/chat/completions` dialect shared by OpenAI and DeepSeek.
//! Images travel as `image_url` content parts.

use super::{ChatProvider, ChatRequest, ProviderError};
use crate::config::ProviderSettings;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for a single HTTP exchange; callers apply tighter deadlines.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Provider for any API implementing OpenAI's chat-completions endpoint.
pub struct OpenAiCompatibleProvider {
    name: String,
    api_key: Secret<String>,
    endpoint: String,
    model: String,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(CLIENT_TIMEOUT).build()?;

        Ok(Self {
            name: settings.name.clone(),
            api_key: settings.api_key.clone(),
            endpoint: format!(
                "{}/chat/completions",
                settings.base_url.trim_end_matches('/')
            ),
            model: settings.model.clone(),
            client,
        })
    }

    fn build_body<'a>(&'a self, request: &'a ChatRequest) -> ChatCompletionRequest<'a> {
        let user_content = if request.image_urls.is_empty() {
            MessageContent::Text(&request.user_text)
        } else {
            let mut parts = vec![ContentPart::Text {
                text: &request.user_text,
            }];
            parts.extend(request.image_urls.iter().map(|url| ContentPart::ImageUrl {
                image_url: ImageUrl { url },
            }));
            MessageContent::Parts(parts)
        };

        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(&request.system),
                },
                Message {
                    role: "user",
                    content: user_content,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "{} API key not configured",
                self.name
            )));
        }

        let body = self.build_body(request);

        tracing::debug!(
            provider = %self.name,
            model = %self.model,
            system_len = request.system.len(),
            image_count = request.image_urls.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::InvalidResponse(format!("Failed to parse response: {}", e))
            }
        })?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

fn map_transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(e.to_string())
    }
}

// ============================================================================
// Chat Completions Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
