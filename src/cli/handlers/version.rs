// src/cli/handlers/version.rs

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;

use crate::cli::handlers::commons;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Prints the version of saga_cmd.")]
struct VersionArgs {
    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

/// The main handler for the `version` command.
pub fn handle(args: Vec<String>) -> Result<()> {
    let version_args = VersionArgs::try_parse_from(&args)?;
    let env = commons::open_environment(None)?;

    let Some(version) = env.version()? else {
        bail!(
            "Could not determine the version of '{}'.",
            env.path().display()
        );
    };

    if version_args.json {
        println!(
            "{}",
            serde_json::json!({ "path": env.path(), "version": version })
        );
    } else {
        println!("{} {}", "saga_cmd".cyan(), version.to_string().bold());
    }
    Ok(())
}
