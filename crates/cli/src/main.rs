use std::process::ExitCode;

fn main() -> ExitCode {
    etymo_cli::run()
}
