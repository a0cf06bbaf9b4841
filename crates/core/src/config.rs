use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::word::WordPolicy;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
    pub sheets: SheetsConfig,
    pub word: WordConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub api_base_url: String,
    pub poll_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub credentials_path: PathBuf,
    pub worksheet: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WordConfig {
    pub policy: WordPolicy,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    DeepSeek,
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::DeepSeek => "https://api.deepseek.com",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::DeepSeek | Self::OpenAi)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub telegram_bot_token: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub spreadsheet_id: Option<String>,
    pub credentials_path: Option<PathBuf>,
    pub word_policy: Option<WordPolicy>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: String::new().into(),
                api_base_url: "https://api.telegram.org".to_string(),
                poll_timeout_secs: 30,
                request_timeout_secs: 40,
            },
            llm: LlmConfig {
                provider: LlmProvider::DeepSeek,
                api_key: None,
                base_url: None,
                model: "deepseek-chat".to_string(),
                temperature: 0.2,
                timeout_secs: 60,
                max_retries: 2,
            },
            sheets: SheetsConfig {
                spreadsheet_id: String::new(),
                credentials_path: PathBuf::from("service_account.json"),
                worksheet: "Sheet1".to_string(),
                timeout_secs: 30,
            },
            word: WordConfig { policy: WordPolicy::Any },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "deepseek" | "deep_seek" => Ok(Self::DeepSeek),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected deepseek|openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl LlmConfig {
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or_else(|| self.provider.default_base_url())
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("etymo.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(telegram) = patch.telegram {
            if let Some(bot_token_value) = telegram.bot_token {
                self.telegram.bot_token = secret_value(bot_token_value);
            }
            if let Some(api_base_url) = telegram.api_base_url {
                self.telegram.api_base_url = api_base_url;
            }
            if let Some(poll_timeout_secs) = telegram.poll_timeout_secs {
                self.telegram.poll_timeout_secs = poll_timeout_secs;
            }
            if let Some(request_timeout_secs) = telegram.request_timeout_secs {
                self.telegram.request_timeout_secs = request_timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(sheets) = patch.sheets {
            if let Some(spreadsheet_id) = sheets.spreadsheet_id {
                self.sheets.spreadsheet_id = spreadsheet_id;
            }
            if let Some(credentials_path) = sheets.credentials_path {
                self.sheets.credentials_path = credentials_path;
            }
            if let Some(worksheet) = sheets.worksheet {
                self.sheets.worksheet = worksheet;
            }
            if let Some(timeout_secs) = sheets.timeout_secs {
                self.sheets.timeout_secs = timeout_secs;
            }
        }

        if let Some(word) = patch.word {
            if let Some(policy) = word.policy {
                self.word.policy = policy;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let bot_token =
            read_env("ETYMO_TELEGRAM_BOT_TOKEN").or_else(|| read_env("TELEGRAM_BOT_TOKEN"));
        if let Some(value) = bot_token {
            self.telegram.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("ETYMO_TELEGRAM_API_BASE_URL") {
            self.telegram.api_base_url = value;
        }
        if let Some(value) = read_env("ETYMO_TELEGRAM_POLL_TIMEOUT_SECS") {
            self.telegram.poll_timeout_secs = parse_u64("ETYMO_TELEGRAM_POLL_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("ETYMO_TELEGRAM_REQUEST_TIMEOUT_SECS") {
            self.telegram.request_timeout_secs =
                parse_u64("ETYMO_TELEGRAM_REQUEST_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ETYMO_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        let api_key = read_env("ETYMO_LLM_API_KEY").or_else(|| read_env("DEEPSEEK_API_KEY"));
        if let Some(value) = api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("ETYMO_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("ETYMO_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("ETYMO_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("ETYMO_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("ETYMO_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("ETYMO_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("ETYMO_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("ETYMO_LLM_MAX_RETRIES", &value)?;
        }

        let spreadsheet_id =
            read_env("ETYMO_SHEETS_SPREADSHEET_ID").or_else(|| read_env("GOOGLE_SHEET_ID"));
        if let Some(value) = spreadsheet_id {
            self.sheets.spreadsheet_id = value;
        }
        if let Some(value) = read_env("ETYMO_SHEETS_CREDENTIALS_PATH") {
            self.sheets.credentials_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("ETYMO_SHEETS_WORKSHEET") {
            self.sheets.worksheet = value;
        }
        if let Some(value) = read_env("ETYMO_SHEETS_TIMEOUT_SECS") {
            self.sheets.timeout_secs = parse_u64("ETYMO_SHEETS_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ETYMO_WORD_POLICY") {
            self.word.policy = value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "ETYMO_WORD_POLICY".to_string(),
                value: value.clone(),
            })?;
        }

        if let Some(value) = read_env("ETYMO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ETYMO_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("ETYMO_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("ETYMO_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("ETYMO_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("ETYMO_LOGGING_LEVEL").or_else(|| read_env("ETYMO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("ETYMO_LOGGING_FORMAT").or_else(|| read_env("ETYMO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bot_token) = overrides.telegram_bot_token {
            self.telegram.bot_token = secret_value(bot_token);
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(llm_base_url);
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(spreadsheet_id) = overrides.spreadsheet_id {
            self.sheets.spreadsheet_id = spreadsheet_id;
        }
        if let Some(credentials_path) = overrides.credentials_path {
            self.sheets.credentials_path = credentials_path;
        }
        if let Some(word_policy) = overrides.word_policy {
            self.word.policy = word_policy;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_telegram(&self.telegram)?;
        validate_llm(&self.llm)?;
        validate_sheets(&self.sheets)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("etymo.toml"), PathBuf::from("config/etymo.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let bot_token = telegram.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(
            "telegram.bot_token is required. Create a bot with @BotFather and copy the token it returns".to_string(),
        ));
    }

    let well_formed = match bot_token.split_once(':') {
        Some((bot_id, secret)) => {
            !bot_id.is_empty() && bot_id.bytes().all(|b| b.is_ascii_digit()) && !secret.is_empty()
        }
        None => false,
    };
    if !well_formed {
        return Err(ConfigError::Validation(
            "telegram.bot_token must look like `<bot id>:<secret>` as issued by @BotFather"
                .to_string(),
        ));
    }

    if !telegram.api_base_url.starts_with("http://")
        && !telegram.api_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "telegram.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if telegram.poll_timeout_secs == 0 || telegram.poll_timeout_secs > 50 {
        return Err(ConfigError::Validation(
            "telegram.poll_timeout_secs must be in range 1..=50".to_string(),
        ));
    }

    if telegram.request_timeout_secs <= telegram.poll_timeout_secs {
        return Err(ConfigError::Validation(
            "telegram.request_timeout_secs must be greater than telegram.poll_timeout_secs"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.provider.requires_api_key() {
        let missing = llm
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "llm.api_key is required for deepseek/openai providers".to_string(),
            ));
        }
    }

    if let Some(base_url) = &llm.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_sheets(sheets: &SheetsConfig) -> Result<(), ConfigError> {
    if sheets.spreadsheet_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "sheets.spreadsheet_id is required. Copy it from the spreadsheet URL (`/d/<id>/edit`)"
                .to_string(),
        ));
    }

    if sheets.credentials_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "sheets.credentials_path must point to a service account JSON key".to_string(),
        ));
    }

    if sheets.worksheet.trim().is_empty() {
        return Err(ConfigError::Validation("sheets.worksheet must not be empty".to_string()));
    }

    if sheets.timeout_secs == 0 || sheets.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "sheets.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    telegram: Option<TelegramPatch>,
    llm: Option<LlmPatch>,
    sheets: Option<SheetsPatch>,
    word: Option<WordPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
    api_base_url: Option<String>,
    poll_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetsPatch {
    spreadsheet_id: Option<String>,
    credentials_path: Option<PathBuf>,
    worksheet: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WordPatch {
    policy: Option<WordPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
