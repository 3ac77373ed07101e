use clap::Parser;
use thiserror::Error;

pub mod args;
pub mod dispatcher;
pub mod handlers;

const AFTER_HELP: &str = "\
Commands:
  run <library> <tool> [-p NAME=VALUE]...   Run one tool
  pipeline <file.toml>                      Run the steps of a pipeline file in order
  library, lib <library>                    List the tools of a library
  version                                   Print the version of saga_cmd
  locate                                    Print the saga_cmd binary that would be used

Run `geochain <command> --help` for the options of a command.";

/// geochain: assemble, run and chain saga_cmd tool calls.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    after_help = AFTER_HELP,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
#[command(trailing_var_arg = true)]
pub struct Cli {
    /// The command followed by its own arguments.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// The external tool finished with a non-zero status after its output was shown.
/// The binary exits with the same code and prints nothing more.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("The tool exited with status {code}.")]
pub struct ToolExit {
    pub code: i32,
}
