//! taskbook - A personal task tracker backed by a JSON file

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = taskbook::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
