// src/cli/handlers/locate.rs

use anyhow::Result;
use clap::Parser;

use crate::cli::handlers::commons;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Prints the saga_cmd binary geochain would use."
)]
struct LocateArgs {}

/// The main handler for the `locate` command.
pub fn handle(args: Vec<String>) -> Result<()> {
    let _locate_args = LocateArgs::try_parse_from(&args)?;
    let env = commons::open_environment(None)?;
    println!("{}", env.path().display());
    Ok(())
}
