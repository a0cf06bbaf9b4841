use etymo_agent::analysis::ModelAnalysis;
use etymo_agent::{ModelExplanationProvider, OpenAiCompatibleClient};
use etymo_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::{block_on, CommandResult, EXIT_CONFIG};

pub const EXIT_INPUT: u8 = 3;
pub const EXIT_PROVIDER: u8 = 4;

#[derive(Debug, Serialize)]
struct ExplainReport<'a> {
    word: &'a str,
    model: &'a str,
    explanation: String,
    analysis: &'a ModelAnalysis,
}

pub fn run(word: &str, json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "explain",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let word = match config.word.policy.normalize(word) {
        Ok(word) => word,
        Err(error) => {
            return CommandResult::failure("explain", "input", error.to_string(), EXIT_INPUT)
        }
    };

    let client = match OpenAiCompatibleClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure("explain", "provider", error.to_string(), EXIT_PROVIDER)
        }
    };
    let provider = ModelExplanationProvider::from_config(client, &config.llm);

    let analysis = match block_on(provider.analyze(word)) {
        Ok(Ok(analysis)) => analysis,
        Ok(Err(error)) => {
            return CommandResult::failure(
                "explain",
                &format!("provider_{}", error.kind),
                error.to_string(),
                EXIT_PROVIDER,
            )
        }
        Err(error) => return CommandResult::failure("explain", "runtime", error, EXIT_PROVIDER),
    };

    let explanation = analysis.explanation();
    if !json_output {
        return CommandResult { exit_code: 0, output: explanation };
    }

    let report = ExplainReport { word, model: &config.llm.model, explanation, analysis: &analysis };
    match serde_json::to_string_pretty(&report) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("explain", "serialization", error.to_string(), 1),
    }
}
