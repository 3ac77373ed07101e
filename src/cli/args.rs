// src/cli/args.rs
use clap::{Args, Parser};

/// Options shared by every command that executes tools.
#[derive(Args, Debug, Default, Clone)]
pub struct ExecFlags {
    /// Echo the tool's progress while it runs.
    #[arg(long, short)]
    pub verbose: bool,

    /// Print the command line(s) without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Do not delete temporary files on exit.
    #[arg(long)]
    pub keep_temp: bool,

    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Runs a single tool.")]
pub struct RunArgs {
    /// Library name or index.
    pub library: String,

    /// Tool name or index within the library.
    pub tool: String,

    /// A tool parameter; `temp` or `temp.<ext>` as value allocates a temporary file.
    #[arg(long = "param", short = 'p', value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// A valueless tool parameter.
    #[arg(long = "switch", short = 's', value_name = "NAME")]
    pub switches: Vec<String>,

    /// Flag inserted right after the binary (e.g. `cores=4`).
    #[arg(long)]
    pub flag: Option<String>,

    /// Report a non-zero exit as an error instead of just passing the status on.
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub exec: ExecFlags,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Runs the steps of a pipeline file in order.")]
pub struct PipelineArgs {
    /// Path to the TOML pipeline file.
    pub file: String,

    /// Flag inserted right after the binary for every step.
    #[arg(long)]
    pub flag: Option<String>,

    /// Keep running the remaining steps after a step fails.
    #[arg(long)]
    pub keep_going: bool,

    #[command(flatten)]
    pub exec: ExecFlags,
}
