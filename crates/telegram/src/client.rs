use std::time::Duration;

use async_trait::async_trait;
use etymo_core::config::TelegramConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::api::{
    AnswerCallbackQuery, ApiResponse, GetUpdates, SendChatAction, SendMessage, Update,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelegramApiError {
    #[error("telegram transport failed: {0}")]
    Transport(String),
    #[error("telegram rejected the bot token")]
    Unauthorized,
    #[error("telegram api error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("telegram response was malformed: {0}")]
    MalformedResponse(String),
}

impl TelegramApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

#[async_trait]
pub trait BotApi: Send + Sync {
    async fn get_updates(&self, request: &GetUpdates) -> Result<Vec<Update>, TelegramApiError>;
    async fn send_message(&self, message: &SendMessage) -> Result<(), TelegramApiError>;
    async fn answer_callback_query(
        &self,
        answer: &AnswerCallbackQuery,
    ) -> Result<(), TelegramApiError>;
    async fn send_chat_action(&self, action: &SendChatAction) -> Result<(), TelegramApiError>;
}

/// Bot API over HTTPS. Every method is a JSON `POST`.
pub struct HttpBotApi {
    http: Client,
    base_url: String,
    token: SecretString,
}

impl HttpBotApi {
    pub fn new(http: Client, base_url: impl Into<String>, token: SecretString) -> Self {
        Self { http, base_url: base_url.into().trim_end_matches('/').to_owned(), token }
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self, TelegramApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|error| TelegramApiError::Transport(error.without_url().to_string()))?;
        Ok(Self::new(http, &config.api_base_url, config.bot_token.clone()))
    }

    /// Method URL. Contains the token, so it must never be logged.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token.expose_secret(), method)
    }

    async fn call<P, R>(&self, method: &str, payload: &P) -> Result<R, TelegramApiError>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!(event_name = "telegram.api.call", method, "calling bot api");

        let response = self
            .http
            .post(self.method_url(method))
            .json(payload)
            .send()
            .await
            .map_err(|error| TelegramApiError::Transport(error.without_url().to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| TelegramApiError::Transport(error.without_url().to_string()))?;

        decode_response(status.as_u16(), &body)
    }
}

#[async_trait]
impl BotApi for HttpBotApi {
    async fn get_updates(&self, request: &GetUpdates) -> Result<Vec<Update>, TelegramApiError> {
        self.call("getUpdates", request).await
    }

    async fn send_message(&self, message: &SendMessage) -> Result<(), TelegramApiError> {
        self.call::<_, serde_json::Value>("sendMessage", message).await.map(|_| ())
    }

    async fn answer_callback_query(
        &self,
        answer: &AnswerCallbackQuery,
    ) -> Result<(), TelegramApiError> {
        self.call::<_, bool>("answerCallbackQuery", answer).await.map(|_| ())
    }

    async fn send_chat_action(&self, action: &SendChatAction) -> Result<(), TelegramApiError> {
        self.call::<_, bool>("sendChatAction", action).await.map(|_| ())
    }
}

fn decode_response<R>(status: u16, body: &str) -> Result<R, TelegramApiError>
where
    R: DeserializeOwned,
{
    let envelope: ApiResponse<R> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if status == 401 => return Err(TelegramApiError::Unauthorized),
        Err(_) if !(200..300).contains(&status) => {
            return Err(TelegramApiError::Api {
                code: i64::from(status),
                description: format!("http status {status}"),
            })
        }
        Err(error) => return Err(TelegramApiError::MalformedResponse(error.to_string())),
    };

    if !envelope.ok {
        let code = envelope.error_code.unwrap_or_else(|| i64::from(status));
        if code == 401 {
            return Err(TelegramApiError::Unauthorized);
        }
        return Err(TelegramApiError::Api {
            code,
            description: envelope.description.unwrap_or_default(),
        });
    }

    envelope
        .result
        .ok_or_else(|| TelegramApiError::MalformedResponse("ok response without result".to_owned()))
}
