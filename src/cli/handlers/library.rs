// src/cli/handlers/library.rs

use anyhow::Result;
use clap::Parser;

use crate::{
    cli::{ToolExit, handlers::commons},
    core::{executable::Executable, identifier::Identifier},
    system::executor::ExecOptions,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Runs a library without a tool, which lists the tools it contains."
)]
struct LibraryArgs {
    /// Library name or index.
    library: String,

    /// Flag inserted right after the binary.
    #[arg(long)]
    flag: Option<String>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

/// The main handler for the `library` command.
pub fn handle(args: Vec<String>) -> Result<()> {
    let library_args = LibraryArgs::try_parse_from(&args)?;
    let id = Identifier::parse(&library_args.library)?;
    let env = commons::open_environment(library_args.flag.as_deref())?;

    let output = env.library(id).execute(ExecOptions::default())?;
    commons::print_output(&output, library_args.json)?;
    if output.success() {
        Ok(())
    } else {
        Err(ToolExit {
            code: output.status().unwrap_or(1),
        }
        .into())
    }
}
