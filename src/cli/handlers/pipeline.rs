// src/cli/handlers/pipeline.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;

use crate::{
    cli::{ToolExit, args::PipelineArgs, handlers::commons},
    core::{
        environment::Environment,
        output::Output,
        pipeline::PipelineOptions,
        pipeline_file,
    },
    system::executor::ExecOptions,
};

/// The main handler for the `pipeline` command.
pub fn handle(args: Vec<String>) -> Result<()> {
    let pipeline_args = PipelineArgs::try_parse_from(&args)?;
    let file_path = Path::new(&pipeline_args.file);
    let file = pipeline_file::load_pipeline(file_path)?;

    let env = commons::cleanup_on_exit(
        commons::open_environment(pipeline_args.flag.as_deref())?,
        pipeline_args.exec.keep_temp,
    );
    let pipeline = pipeline_file::build_pipeline(&env, &file)
        .with_context(|| format!("Could not build the pipeline in '{}'", file_path.display()))?;

    if pipeline_args.exec.dry_run {
        for (index, step) in pipeline.steps().iter().enumerate() {
            println!("{} {}", format!("[{}]", index + 1).blue(), step.describe().dimmed());
            println!("    {}", step.command());
        }
        return Ok(());
    }

    let options = PipelineOptions {
        exec: ExecOptions {
            strict: false,
            verbose: pipeline_args.exec.verbose,
        },
        keep_going: pipeline_args.keep_going,
    };

    let labels: Vec<String> = pipeline.steps().iter().map(|s| s.tool().label()).collect();
    match pipeline.execute(options) {
        Ok(outputs) => report(&env, &labels, &outputs, pipeline_args.exec.json),
        Err(err) => {
            if !pipeline_args.exec.json {
                print_summary(&env, &labels, err.completed());
            }
            Err(err.into())
        }
    }
}

fn report(env: &Environment, labels: &[String], outputs: &[Output], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outputs)?);
    } else {
        print_summary(env, labels, outputs);
    }

    // With --keep-going the run finishes, but the first failure still sets the exit code.
    match outputs.iter().find(|o| !o.success()) {
        Some(failed) => Err(ToolExit {
            code: failed.status().unwrap_or(1),
        }
        .into()),
        None => Ok(()),
    }
}

fn print_summary(env: &Environment, labels: &[String], outputs: &[Output]) {
    if outputs.is_empty() {
        return;
    }
    let formats = env.formats();
    for (index, (label, output)) in labels.iter().zip(outputs).enumerate() {
        let marker = if output.success() {
            "✔".green()
        } else {
            "✘".red()
        };
        println!("{} {} {}", marker, format!("[{}]", index + 1).blue(), label);
        commons::print_artifacts(output, &formats);
    }
}
