use std::env;
use std::path::{Path, PathBuf};

use etymo_core::config::{AppConfig, LoadOptions};
use etymo_sheets::{signing_key, ServiceAccountKey};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::commands::config::redact_bot_token;
use crate::commands::{escape_json, CommandResult, EXIT_CONFIG};

const DEFAULT_CREDENTIALS_PATH: &str = "service_account.json";

/// Values the bot cannot start without, with every env key that can supply each.
const REQUIRED_VALUES: [(&str, &[&str]); 3] = [
    ("telegram_bot_token", &["ETYMO_TELEGRAM_BOT_TOKEN", "TELEGRAM_BOT_TOKEN"]),
    ("llm_api_key", &["ETYMO_LLM_API_KEY", "DEEPSEEK_API_KEY"]),
    ("spreadsheet_id", &["ETYMO_SHEETS_SPREADSHEET_ID", "GOOGLE_SHEET_ID"]),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_CONFIG };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    let credentials_path = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            checks.extend(required_values_from_config(&config));
            config.sheets.credentials_path
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            checks.extend(REQUIRED_VALUES.iter().map(|(name, keys)| env_value_check(*name, keys)));
            env::var_os("ETYMO_SHEETS_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH))
        }
    };
    checks.push(check_service_account(&credentials_path));

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all credential checks passed".to_string()
    } else {
        "doctor: one or more credential checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn required_values_from_config(config: &AppConfig) -> Vec<DoctorCheck> {
    let llm_key = match &config.llm.api_key {
        Some(key) if is_placeholder(key.expose_secret()) => {
            DoctorCheck::fail("llm_api_key", "still holds a placeholder value")
        }
        Some(_) => DoctorCheck::pass("llm_api_key", "set (<redacted>)"),
        None if !config.llm.provider.requires_api_key() => {
            DoctorCheck::pass("llm_api_key", "not required for the configured provider")
        }
        None => DoctorCheck::fail("llm_api_key", "missing"),
    };

    let spreadsheet_id = &config.sheets.spreadsheet_id;
    let sheet = if is_placeholder(spreadsheet_id) {
        DoctorCheck::fail("spreadsheet_id", "still holds a placeholder value")
    } else {
        DoctorCheck::pass("spreadsheet_id", format!("set ({spreadsheet_id})"))
    };

    vec![
        DoctorCheck::pass(
            "telegram_bot_token",
            format!("set ({})", redact_bot_token(config.telegram.bot_token.expose_secret())),
        ),
        llm_key,
        sheet,
    ]
}

/// Used when the config does not load: tells the operator which variable is missing.
fn env_value_check(name: &'static str, env_keys: &[&str]) -> DoctorCheck {
    let found = env_keys
        .iter()
        .find_map(|key| {
            env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
        });

    match found {
        Some((key, value)) if is_placeholder(&value) => {
            DoctorCheck::fail(name, format!("{key} still holds a placeholder value"))
        }
        Some((key, _)) => DoctorCheck::pass(name, format!("set via {key}")),
        None => DoctorCheck::fail(name, format!("missing (set {})", env_keys.join(" or "))),
    }
}

fn is_placeholder(value: &str) -> bool {
    value.trim().starts_with("REPLACE")
}

fn check_service_account(path: &Path) -> DoctorCheck {
    let key = match ServiceAccountKey::load(path) {
        Ok(key) => key,
        Err(error) => return DoctorCheck::fail("service_account", error.to_string()),
    };

    // A mangled PEM would otherwise only surface on the first save.
    match signing_key(&key) {
        Ok(_) => DoctorCheck::pass(
            "service_account",
            format!(
                "project {}, client {}",
                key.project_id.as_deref().unwrap_or("N/A"),
                key.client_email
            ),
        ),
        Err(error) => DoctorCheck::fail("service_account", error.to_string()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{env_value_check, is_placeholder, CheckStatus};

    #[test]
    fn placeholder_values_are_detected() {
        assert!(is_placeholder("REPLACE_WITH_YOUR_TOKEN"));
        assert!(!is_placeholder("123456:abc"));
    }

    #[test]
    fn unset_variables_fail_with_hint() {
        let check = env_value_check("demo", &["ETYMO_DOCTOR_UNIT_TEST_UNSET"]);

        assert_eq!(check.status, CheckStatus::Fail);
        assert!(check.details.contains("ETYMO_DOCTOR_UNIT_TEST_UNSET"));
    }
}
