// src/bin/geochain.rs

use clap::Parser;
use colored::*;
use geochain::{
    cli::{Cli, ToolExit, dispatcher},
    core::pipeline::PipelineError,
    system::executor::ExecutionError,
};

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    log::debug!("CLI args parsed: {:?}", cli);

    if let Err(e) = dispatcher::dispatch(cli.args) {
        // --- Centralized Error Handling ---
        // Help and usage errors of a command's own parser print themselves.
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            clap_err.exit();
        }
        // The tool already printed its output; only its status is passed on.
        if let Some(exit) = e.downcast_ref::<ToolExit>() {
            std::process::exit(exit.code);
        }

        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}

/// A failed tool run exits with the tool's own status; everything else with 1.
fn exit_code(e: &anyhow::Error) -> i32 {
    let output = match e.downcast_ref::<ExecutionError>() {
        Some(ExecutionError::NonZeroExit { output, .. }) => Some(output.as_ref()),
        _ => e.downcast_ref::<PipelineError>().and_then(PipelineError::output),
    };
    output
        .and_then(|o| o.status())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}
