// src/core/library.rs

use crate::core::{
    command::Flag, environment::Environment, executable::Executable, identifier::Identifier,
    tool::Tool,
};

/// A named (or numbered) library of the tool suite.
///
/// Carries its own copy of the flag, taken from the environment at navigation time.
#[derive(Debug, Clone)]
pub struct Library<'env> {
    env: &'env Environment,
    id: Identifier,
    flag: Flag,
}

impl<'env> Library<'env> {
    pub(crate) fn new(env: &'env Environment, id: Identifier) -> Self {
        Self {
            env,
            id,
            flag: env.flag().clone(),
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Navigates to a tool of this library. The tool starts with this library's flag.
    pub fn tool(&self, id: impl Into<Identifier>) -> Tool<'env> {
        Tool::new(self.env, self.id.clone(), id.into(), self.flag.clone())
    }
}

impl Executable for Library<'_> {
    fn environment(&self) -> &Environment {
        self.env
    }

    fn flag(&self) -> &Flag {
        &self.flag
    }

    fn flag_mut(&mut self) -> &mut Flag {
        &mut self.flag
    }

    fn identifiers(&self) -> Vec<String> {
        vec![self.id.token()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_command_appends_its_identifier() {
        let env = Environment::new("/bin/tool_cmd");
        let library = env.library("alpha");
        assert_eq!(library.command().tokens(), ["/bin/tool_cmd", "alpha"]);
        assert_eq!(env.library(3).command().tokens(), ["/bin/tool_cmd", "3"]);
    }

    #[test]
    fn test_library_inherits_flag_at_navigation() {
        let mut env = Environment::new("saga_cmd");
        env.set_flag("cores=2");
        let mut library = env.library("grid_tools");
        assert_eq!(library.command().tokens(), ["saga_cmd", "--cores=2", "grid_tools"]);

        library.set_flag("flags=s");
        assert_eq!(library.command().tokens(), ["saga_cmd", "--flags=s", "grid_tools"]);
        assert_eq!(env.command().tokens(), ["saga_cmd", "--cores=2"]);

        library.clear_flag();
        assert_eq!(library.command().tokens(), ["saga_cmd", "grid_tools"]);
    }
}
