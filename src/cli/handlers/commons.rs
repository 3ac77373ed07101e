// src/cli/handlers/commons.rs

// Shared functions used by multiple handlers.

use anyhow::{Context, Result};
use colored::Colorize;
use scopeguard::ScopeGuard;

use crate::{
    core::{
        config_loader,
        environment::Environment,
        executable::Executable,
        output::{Formats, Output},
        paths::expand_path_template,
    },
    models::Config,
    system::discovery::SearchLocator,
};

/// Builds the environment from the user configuration: an explicit binary path wins,
/// otherwise the binary is searched for. `flag` overrides the configured flag.
pub fn open_environment(flag: Option<&str>) -> Result<Environment> {
    let config = config_loader::load_config()?;
    environment_from_config(&config, flag)
}

pub fn environment_from_config(config: &Config, flag: Option<&str>) -> Result<Environment> {
    let mut env = match &config.saga_cmd {
        Some(template) => {
            let path = expand_path_template(template)?;
            Environment::checked(&path)
                .with_context(|| format!("Configured saga_cmd '{}' is not usable", template))?
        }
        None => {
            let search_dirs = config
                .search_dirs
                .iter()
                .map(|dir| expand_path_template(dir))
                .collect::<Result<Vec<_>, _>>()?;
            let locator = SearchLocator::for_current_platform().with_dirs(search_dirs);
            Environment::locate(&locator).context(
                "saga_cmd was not found. Install SAGA GIS or set `saga_cmd` in the config file",
            )?
        }
    };

    if let Some(root) = &config.temp_root {
        env = env.with_temp_root(expand_path_template(root)?);
    }
    if let Some(flag) = flag.or(config.flag.as_deref()) {
        env.set_flag(flag);
    }
    log::debug!("Using saga_cmd at '{}'.", env.path().display());
    Ok(env)
}

/// Deletes the environment's temporary files when the handler returns, on success
/// and on error alike, unless `keep` is set.
pub fn cleanup_on_exit(env: Environment, keep: bool) -> ScopeGuard<Environment, impl FnOnce(Environment)> {
    scopeguard::guard(env, move |env| {
        if keep {
            let files = env.temp_files();
            if !files.is_empty() {
                eprintln!(
                    "{} {} temporary file(s) kept:",
                    "i".blue(),
                    files.len()
                );
                for file in files {
                    eprintln!("  {}", file.display());
                }
            }
            return;
        }
        if let Err(e) = env.cleanup() {
            log::warn!("Temporary files were not fully removed: {}", e);
        }
    })
}

/// Prints what the tool wrote, or the whole output as JSON.
pub fn print_output(output: &Output, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }
    let text = output.text().trim_end();
    if !text.is_empty() {
        println!("{}", text);
    }
    let stderr = output.stderr().trim_end();
    if !stderr.is_empty() {
        eprintln!("{}", stderr.dimmed());
    }
    Ok(())
}

/// Lists the files the call's parameters point to.
pub fn print_artifacts(output: &Output, formats: &Formats) {
    for (name, artifact) in output.files_with(formats) {
        println!(
            "  {:<14} {} {}",
            name.cyan(),
            artifact.path.display(),
            format!("({:?})", artifact.kind).to_lowercase().dimmed()
        );
    }
}
