use std::sync::Arc;

use etymo_agent::{LlmError, ModelExplanationProvider, OpenAiCompatibleClient};
use etymo_core::config::{AppConfig, ConfigError};
use etymo_core::{InteractionCore, SessionStore};
use etymo_sheets::{CredentialError, ServiceAccountKey, SheetsError, SheetsRowStore};
use etymo_telegram::{HttpBotApi, LongPollRunner, TelegramApiError};
use thiserror::Error;
use tracing::info;

pub type BotCore =
    InteractionCore<ModelExplanationProvider<OpenAiCompatibleClient>, SheetsRowStore>;

pub struct Application {
    pub config: AppConfig,
    pub sessions: Arc<SessionStore>,
    pub runner: LongPollRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error("language model client setup failed: {0}")]
    Llm(#[source] LlmError),
    #[error("spreadsheet client setup failed: {0}")]
    Sheets(#[source] SheetsError),
    #[error("telegram client setup failed: {0}")]
    Telegram(#[source] TelegramApiError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let key = ServiceAccountKey::load(&config.sheets.credentials_path)?;
    info!(
        event_name = "system.bootstrap.credentials_loaded",
        correlation_id = "bootstrap",
        client_email = %key.client_email,
        project_id = key.project_id.as_deref().unwrap_or("unknown"),
        "service account credentials loaded"
    );
    let store = SheetsRowStore::from_config(&config.sheets, key).map_err(BootstrapError::Sheets)?;

    let client = OpenAiCompatibleClient::from_config(&config.llm).map_err(BootstrapError::Llm)?;
    info!(
        event_name = "system.bootstrap.llm_ready",
        correlation_id = "bootstrap",
        endpoint = %client.endpoint(),
        model = %config.llm.model,
        "language model client ready"
    );
    let provider = ModelExplanationProvider::from_config(client, &config.llm);

    let sessions = Arc::new(SessionStore::new());
    let core: BotCore = InteractionCore::new(provider, store)
        .with_sessions(sessions.clone())
        .with_word_policy(config.word.policy);

    let api = HttpBotApi::from_config(&config.telegram).map_err(BootstrapError::Telegram)?;
    let runner = LongPollRunner::from_config(Arc::new(api), Arc::new(core), &config.telegram);
    info!(
        event_name = "system.bootstrap.complete",
        correlation_id = "bootstrap",
        word_policy = ?config.word.policy,
        "application bootstrap complete"
    );

    Ok(Application { config, sessions, runner })
}
