// src/core/executable.rs

use crate::{
    core::{
        command::{Command, Flag},
        environment::Environment,
        output::Output,
    },
    system::executor::{ExecOptions, ExecutionError},
};

/// Shared behaviour of everything that maps onto a `saga_cmd` command line:
/// the environment itself, a library and a tool.
///
/// The command is recomputed from the current path, flag and identifiers on every
/// call, so it never goes stale after [`Executable::set_flag`].
pub trait Executable {
    fn environment(&self) -> &Environment;

    fn flag(&self) -> &Flag;

    fn flag_mut(&mut self) -> &mut Flag;

    /// The tokens that follow the flag (library and tool identifiers).
    fn identifiers(&self) -> Vec<String>;

    fn set_flag(&mut self, value: impl Into<String>)
    where
        Self: Sized,
    {
        self.flag_mut().set(value);
    }

    fn clear_flag(&mut self) {
        self.flag_mut().clear();
    }

    fn command(&self) -> Command {
        Command::compose(
            self.environment().program(),
            self.flag(),
            self.identifiers(),
        )
    }

    /// Runs the command without parameters. For a library this lists its tools,
    /// for a tool it prints its usage.
    fn execute(&self, options: ExecOptions) -> Result<Output, ExecutionError> {
        self.environment().run(self.command(), Vec::new(), options)
    }
}
