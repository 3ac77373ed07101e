use anyhow::{Result, bail};

use crate::cli::handlers;

// --- Command Definition and Registry ---

/// Defines a command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>) -> Result<()>,
}

/// The single source of truth for all commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "run",
        aliases: &[],
        handler: handlers::run::handle,
    },
    CommandDefinition {
        name: "pipeline",
        aliases: &["pipe"],
        handler: handlers::pipeline::handle,
    },
    CommandDefinition {
        name: "library",
        aliases: &["lib"],
        handler: handlers::library::handle,
    },
    CommandDefinition {
        name: "version",
        aliases: &[],
        handler: handlers::version::handle,
    },
    CommandDefinition {
        name: "locate",
        aliases: &["which"],
        handler: handlers::locate::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

fn command_names() -> String {
    COMMAND_REGISTRY
        .iter()
        .map(|cmd| cmd.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Routes `geochain <command> [args...]` to the command's handler.
pub fn dispatch(all_args: Vec<String>) -> Result<()> {
    log::debug!("Dispatching args: {:?}", all_args);

    let mut args = all_args.into_iter();
    let Some(name) = args.next() else {
        bail!(
            "No command given. Available commands: {}. Try `geochain --help`.",
            command_names()
        );
    };

    match find_command(&name) {
        Some(command) => (command.handler)(args.collect()),
        None => bail!(
            "Unknown command '{}'. Available commands: {}.",
            name,
            command_names()
        ),
    }
}
