// src/cli/handlers/run.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::Colorize;

use crate::{
    cli::{ToolExit, args::RunArgs, handlers::commons},
    core::{
        identifier::Identifier,
        parameters::{self, ParamValue, Parameters},
    },
    system::executor::ExecOptions,
};

/// The main handler for the `run` command.
pub fn handle(args: Vec<String>) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;
    let params = collect_parameters(&run_args.params, &run_args.switches)?;
    let library = Identifier::parse(&run_args.library)?;
    let tool_id = Identifier::parse(&run_args.tool)?;

    let env = commons::cleanup_on_exit(
        commons::open_environment(run_args.flag.as_deref())?,
        run_args.exec.keep_temp,
    );
    let call = env.tool(library, tool_id).prepare(params)?;

    if run_args.exec.dry_run {
        println!("{}", call.describe().dimmed());
        println!("{}", call.command());
        return Ok(());
    }

    if run_args.exec.verbose {
        println!("{} {}", "→".blue(), call.describe().green());
    }

    let output = call.execute(ExecOptions {
        strict: run_args.strict,
        verbose: run_args.exec.verbose,
    })?;

    commons::print_output(&output, run_args.exec.json)?;
    if !output.success() {
        return Err(ToolExit {
            code: output.status().unwrap_or(1),
        }
        .into());
    }
    if !run_args.exec.json && run_args.exec.keep_temp {
        commons::print_artifacts(&output, &env.formats());
    }
    Ok(())
}

/// Turns `NAME=VALUE` assignments and switch names into ordered parameters.
/// Switches come after the assignments.
fn collect_parameters(assignments: &[String], switches: &[String]) -> Result<Parameters> {
    let mut params = Parameters::new();
    for raw in assignments {
        let (name, value) = parameters::parse_assignment(raw)
            .ok_or_else(|| anyhow!("Invalid parameter '{}', expected NAME=VALUE.", raw))?;
        params.insert(name, value);
    }
    for name in switches {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow!("A switch needs a name."));
        }
        params.insert(name, ParamValue::Switch);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_parameters_keeps_order() {
        let params = collect_parameters(
            &["elevation=dem.sdat".to_string(), "slope=temp.sdat".to_string()],
            &["verbose".to_string()],
        )
        .unwrap();
        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["elevation", "slope", "verbose"]);
        assert!(params.get("slope").unwrap().is_placeholder());
        assert_eq!(params.get("verbose"), Some(&ParamValue::Switch));
    }

    #[test]
    fn test_collect_parameters_rejects_missing_equals() {
        let err = collect_parameters(&["elevation".to_string()], &[]).unwrap_err();
        assert!(err.to_string().contains("expected NAME=VALUE"));
    }

    #[test]
    fn test_run_args_parse() {
        let args = RunArgs::try_parse_from([
            "ta_morphometry",
            "0",
            "-p",
            "elevation=dem.sdat",
            "--switch",
            "verbose",
            "--flag",
            "cores=2",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.library, "ta_morphometry");
        assert_eq!(args.params, ["elevation=dem.sdat"]);
        assert_eq!(args.flag.as_deref(), Some("cores=2"));
        assert!(args.exec.dry_run);
        assert!(!args.strict);
    }
}
