use std::process::ExitCode;

use epicity::runner::run_with_args;

fn main() -> ExitCode {
    let summary = match run_with_args() {
        Ok(summary) => summary,
        Err(error) => {
            eprintln!("epicity: {error}");
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("epicity: {error}");
            ExitCode::FAILURE
        }
    }
}
