// serelay - Minimal serial terminal
use clap::Parser;
use serelay::cli::{execute_command, Args};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match execute_command(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_silent() {
                eprintln!("serelay: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
