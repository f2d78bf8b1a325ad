use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::AppConfig;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

// Every level is optional so a response that is valid JSON but
// missing fields can be reported instead of failing deserialization
// with an unhelpful message.
#[derive(Deserialize, Debug, Default)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Returns the content of the first choice, checking that each
    /// field on the way there is present.
    pub fn into_content(self) -> Result<String, CompletionError> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            CompletionError::MalformedResponse("response contains no choices".to_string())
        })?;
        let message = choice.message.ok_or_else(|| {
            CompletionError::MalformedResponse("first choice has no message".to_string())
        })?;
        message.content.ok_or_else(|| {
            CompletionError::MalformedResponse("first choice message has no content".to_string())
        })
    }
}

/// Failures of a single completion request. All of them are
/// recoverable and the `Display` text is what gets shown to the user
/// in place of a reply.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum CompletionError {
    #[error("Error: A network error occurred: {0}")]
    Network(String),

    #[error("Error: Authentication failed. Please check your API key.")]
    Unauthorized,

    #[error("Error: HTTP {status} - {body}")]
    Http { status: u16, body: String },

    #[error("Error: Malformed response from the completion API: {0}")]
    MalformedResponse(String),
}

/// Turns one user message into one assistant message.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, user_text: &str) -> Result<String, CompletionError>;
}

pub type BoxedCompletionClient = Box<dyn CompletionClient + Send + Sync + 'static>;

/// Client for an OpenAI compatible chat completion API such as
/// OpenRouter. Sends only the current user message, no history.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    timeout: Option<Duration>,
}

impl OpenAiClient {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens: crate::core::config::DEFAULT_MAX_TOKENS,
            timeout: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.openai_api_hostname,
            &config.openai_api_key,
            &config.openai_model,
        )
        .max_tokens(config.max_tokens)
        .timeout(config.request_timeout)
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.api_hostname.trim_end_matches("/")
        )
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, user_text: &str) -> Result<String, CompletionError> {
        let payload = CompletionRequest {
            model: &self.model,
            messages: vec![Message::new(Role::User, user_text)],
            max_tokens: self.max_tokens,
        };
        let url = self.url();
        tracing::debug!("Sending completion request to {} with model {}", url, self.model);

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Completion API rejected the credential");
            return Err(CompletionError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Completion API returned {}: {}", status, body);
            return Err(CompletionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;
        let parsed = serde_json::from_str::<CompletionResponse>(&body).map_err(|e| {
            tracing::warn!("Parsing completion response failed for {}\nError:{}", body, e);
            CompletionError::MalformedResponse(e.to_string())
        })?;

        parsed.into_content().inspect_err(|e| {
            tracing::warn!("{}. Resp:\n\n {}", e, body);
        })
    }
}
