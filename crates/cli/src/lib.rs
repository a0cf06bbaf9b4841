pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "etymo",
    about = "Etymo operator CLI",
    long_about = "Check credentials, inspect configuration, and try the explanation provider \
                  without starting the bot.",
    after_help = "Examples:\n  etymo doctor --json\n  etymo config\n  etymo explain מכין"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Check bot token, model key, spreadsheet id and service account file")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Ask the configured model to explain one word; nothing is saved")]
    Explain {
        #[arg(help = "Word to explain")]
        word: String,
        #[arg(long, help = "Emit the parsed analysis as JSON")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Explain { word, json } => commands::explain::run(&word, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
