#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = clipflow_lib::cli::Cli::parse();
    match clipflow_lib::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("clipflow: {err}");
            ExitCode::FAILURE
        }
    }
}
