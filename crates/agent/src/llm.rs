use std::time::Duration;

use async_trait::async_trait;
use etymo_core::config::LlmConfig;
use etymo_core::ProviderError;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_owned(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_owned(), content: content.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("llm transport failed: {0}")]
    Transport(String),
    #[error("llm rejected credentials (status {status})")]
    Unauthorized { status: u16 },
    #[error("llm returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm response was malformed: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Unauthorized { .. } | Self::MalformedResponse(_) => false,
        }
    }
}

impl From<LlmError> for ProviderError {
    fn from(error: LlmError) -> Self {
        match &error {
            LlmError::Transport(_) | LlmError::Status { .. } => {
                ProviderError::network(error.to_string())
            }
            LlmError::Unauthorized { .. } => ProviderError::authentication(error.to_string()),
            LlmError::MalformedResponse(_) => ProviderError::malformed(error.to_string()),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Client for any endpoint speaking the OpenAI chat-completions dialect.
pub struct OpenAiCompatibleClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            base_url: config.effective_base_url().trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_secs(2),
        })
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let mut builder = self.http.post(self.endpoint()).json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response =
            builder.send().await.map_err(|error| LlmError::Transport(error.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|error| LlmError::Transport(error.to_string()))?;

        check_status(status, &body)?;
        extract_content(&body)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(content) => {
                    debug!(attempt, model = %request.model, "llm completion received");
                    return Ok(content);
                }
                Err(error) if error.is_retryable() && attempt < self.max_retries => {
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        error = %error,
                        "llm request failed, retrying"
                    );
                    attempt += 1;
                    if !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn check_status(status: StatusCode, body: &str) -> Result<(), LlmError> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(LlmError::Unauthorized { status: status.as_u16() });
    }

    let mut body = body.trim().to_owned();
    body.truncate(body.char_indices().nth(200).map(|(idx, _)| idx).unwrap_or(body.len()));
    Err(LlmError::Status { status: status.as_u16(), body })
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

fn extract_content(body: &str) -> Result<String, LlmError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|error| LlmError::MalformedResponse(format!("invalid json: {error}")))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_owned())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| LlmError::MalformedResponse("no message content in first choice".to_owned()))
}
