use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use etymo_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field<'a> {
    key: &'static str,
    value: String,
    env_keys: &'a [&'static str],
}

impl<'a> Field<'a> {
    fn new(key: &'static str, value: impl Into<String>, env_keys: &'a [&'static str]) -> Self {
        Self { key, value: value.into(), env_keys }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field<'static>> {
    let llm_api_key = match &config.llm.api_key {
        Some(key) if !key.expose_secret().trim().is_empty() => "<redacted>",
        _ => "<unset>",
    };

    vec![
        Field::new(
            "telegram.bot_token",
            redact_bot_token(config.telegram.bot_token.expose_secret()),
            &["ETYMO_TELEGRAM_BOT_TOKEN", "TELEGRAM_BOT_TOKEN"],
        ),
        Field::new(
            "telegram.api_base_url",
            &config.telegram.api_base_url,
            &["ETYMO_TELEGRAM_API_BASE_URL"],
        ),
        Field::new(
            "telegram.poll_timeout_secs",
            config.telegram.poll_timeout_secs.to_string(),
            &["ETYMO_TELEGRAM_POLL_TIMEOUT_SECS"],
        ),
        Field::new(
            "telegram.request_timeout_secs",
            config.telegram.request_timeout_secs.to_string(),
            &["ETYMO_TELEGRAM_REQUEST_TIMEOUT_SECS"],
        ),
        Field::new(
            "llm.provider",
            format!("{:?}", config.llm.provider).to_lowercase(),
            &["ETYMO_LLM_PROVIDER"],
        ),
        Field::new("llm.api_key", llm_api_key, &["ETYMO_LLM_API_KEY", "DEEPSEEK_API_KEY"]),
        Field::new("llm.base_url", config.llm.effective_base_url(), &["ETYMO_LLM_BASE_URL"]),
        Field::new("llm.model", &config.llm.model, &["ETYMO_LLM_MODEL"]),
        Field::new(
            "llm.temperature",
            config.llm.temperature.to_string(),
            &["ETYMO_LLM_TEMPERATURE"],
        ),
        Field::new(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["ETYMO_LLM_TIMEOUT_SECS"],
        ),
        Field::new(
            "llm.max_retries",
            config.llm.max_retries.to_string(),
            &["ETYMO_LLM_MAX_RETRIES"],
        ),
        Field::new(
            "sheets.spreadsheet_id",
            &config.sheets.spreadsheet_id,
            &["ETYMO_SHEETS_SPREADSHEET_ID", "GOOGLE_SHEET_ID"],
        ),
        Field::new(
            "sheets.credentials_path",
            config.sheets.credentials_path.display().to_string(),
            &["ETYMO_SHEETS_CREDENTIALS_PATH"],
        ),
        Field::new("sheets.worksheet", &config.sheets.worksheet, &["ETYMO_SHEETS_WORKSHEET"]),
        Field::new(
            "sheets.timeout_secs",
            config.sheets.timeout_secs.to_string(),
            &["ETYMO_SHEETS_TIMEOUT_SECS"],
        ),
        Field::new(
            "word.policy",
            format!("{:?}", config.word.policy).to_lowercase(),
            &["ETYMO_WORD_POLICY"],
        ),
        Field::new(
            "server.bind_address",
            &config.server.bind_address,
            &["ETYMO_SERVER_BIND_ADDRESS"],
        ),
        Field::new(
            "server.health_check_port",
            config.server.health_check_port.to_string(),
            &["ETYMO_SERVER_HEALTH_CHECK_PORT"],
        ),
        Field::new(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["ETYMO_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        Field::new(
            "logging.level",
            &config.logging.level,
            &["ETYMO_LOGGING_LEVEL", "ETYMO_LOG_LEVEL"],
        ),
        Field::new(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["ETYMO_LOGGING_FORMAT", "ETYMO_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("etymo.toml"), PathBuf::from("config/etymo.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the numeric bot id, hides the secret half.
pub(crate) fn redact_bot_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((bot_id, _)) = trimmed.split_once(':') {
        return format!("{bot_id}:***");
    }

    "<redacted>".to_string()
}
