// src/core/tool.rs

use crate::{
    core::{
        command::{Command, Flag},
        environment::Environment,
        executable::Executable,
        identifier::{Identifier, NavigationError},
        output::Output,
        parameters::{self, ParamValue, Parameters, ResolvedParam},
        pipeline::Pipeline,
        temp_files::TempFileError,
    },
    system::executor::{ExecOptions, ExecutionError},
};
use std::path::Path;
use uuid::Uuid;

/// A single tool inside a library.
#[derive(Debug, Clone)]
pub struct Tool<'env> {
    env: &'env Environment,
    library: Identifier,
    id: Identifier,
    flag: Flag,
}

impl<'env> Tool<'env> {
    pub(crate) fn new(
        env: &'env Environment,
        library: Identifier,
        id: Identifier,
        flag: Flag,
    ) -> Self {
        Self {
            env,
            library,
            id,
            flag,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// `library / tool`, as shown in logs and verbose output.
    pub fn label(&self) -> String {
        format!("{} / {}", self.library, self.id)
    }

    /// Binds parameters to this tool.
    ///
    /// Every placeholder gets a fresh path in the environment's temporary directory
    /// right away, so later steps can reference it before anything runs.
    pub fn prepare(&self, params: Parameters) -> Result<ToolCall<'env>, TempFileError> {
        let id = Uuid::new_v4();
        let mut resolved = Vec::with_capacity(params.len());
        for (name, value) in params {
            let param = match value {
                ParamValue::Text(text) => ResolvedParam {
                    name,
                    value: Some(text),
                    temporary: false,
                },
                ParamValue::Switch => ResolvedParam {
                    name,
                    value: None,
                    temporary: false,
                },
                ParamValue::Temp { extension } => {
                    let path = self.env.allocate_temp(id, &name, extension.as_deref())?;
                    ResolvedParam {
                        name,
                        value: Some(path.to_string_lossy().into_owned()),
                        temporary: true,
                    }
                }
            };
            resolved.push(param);
        }
        Ok(ToolCall {
            id,
            tool: self.clone(),
            params: resolved,
        })
    }

    /// Prepares and runs in one go.
    pub fn execute_with(
        &self,
        params: Parameters,
        options: ExecOptions,
    ) -> Result<Output, ExecutionError> {
        self.prepare(params)?.execute(options)
    }
}

impl Executable for Tool<'_> {
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
        vec![self.library.token(), self.id.token()]
    }
}

/// A tool bound to concrete parameter values, ready to run.
///
/// Placeholders are already resolved to real paths, which is what lets a later
/// pipeline step consume an earlier step's output.
#[derive(Debug, Clone)]
pub struct ToolCall<'env> {
    id: Uuid,
    tool: Tool<'env>,
    params: Vec<ResolvedParam>,
}

impl<'env> ToolCall<'env> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tool(&self) -> &Tool<'env> {
        &self.tool
    }

    pub fn parameters(&self) -> &[ResolvedParam] {
        &self.params
    }

    /// The resolved value of `name`; `None` for switches and unknown names.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|p| p.value.as_deref())
    }

    /// The temporary path allocated for `name`, if it was a placeholder.
    pub fn substituted(&self, name: &str) -> Option<&Path> {
        self.find(name)
            .filter(|p| p.temporary)
            .and_then(|p| p.value.as_deref())
            .map(Path::new)
    }

    /// The value of `name` as input for another call.
    pub fn reference(&self, name: &str) -> Result<ParamValue, NavigationError> {
        let param = self
            .find(name)
            .ok_or_else(|| NavigationError::UnknownParameter {
                call: self.tool.label(),
                param: name.to_string(),
            })?;
        param
            .value
            .clone()
            .map(ParamValue::Text)
            .ok_or_else(|| NavigationError::ValuelessParameter {
                call: self.tool.label(),
                param: name.to_string(),
            })
    }

    /// The full command line: tool command followed by the encoded parameters.
    pub fn command(&self) -> Command {
        let mut command = self.tool.command();
        command.extend(parameters::encode(&self.params));
        command
    }

    pub fn describe(&self) -> String {
        let inline = parameters::format_inline(&self.params);
        if inline.is_empty() {
            self.tool.label()
        } else {
            format!("{}\n    {}", self.tool.label(), inline)
        }
    }

    pub fn execute(&self, options: ExecOptions) -> Result<Output, ExecutionError> {
        log::debug!("Running {}", self.tool.label());
        self.tool
            .environment()
            .run(self.command(), self.params.clone(), options)
    }

    /// Chains this call with `next`. Nothing runs until the pipeline is executed.
    pub fn then(self, next: impl Into<Pipeline<'env>>) -> Pipeline<'env> {
        Pipeline::from(self).then(next)
    }

    fn find(&self, name: &str) -> Option<&ResolvedParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::RecordingRunner;
    use std::path::PathBuf;

    #[test]
    fn test_tool_command_ends_with_library_and_tool() {
        let env = Environment::new("/bin/tool_cmd");
        let tool = env.library("alpha").tool("beta");
        assert_eq!(tool.command().tokens(), ["/bin/tool_cmd", "alpha", "beta"]);
        assert_eq!(tool.command(), env.tool("alpha", "beta").command());
        assert_eq!(env.tool(0, 3).command().tokens()[1..], ["0", "3"]);
    }

    #[test]
    fn test_identifier_text_passes_through_verbatim() {
        let env = Environment::new("saga_cmd");
        assert_eq!(
            env.tool("lib", "007").command().tokens(),
            ["saga_cmd", "lib", "007"]
        );
        assert_eq!(env.library("00").command().tokens(), ["saga_cmd", "00"]);
    }

    #[test]
    fn test_tool_inherits_library_flag() {
        let env = Environment::new("saga_cmd");
        let mut library = env.library("io_gdal");
        library.set_flag("cores=4");
        let tool = library.tool(0);
        assert_eq!(tool.command().tokens(), ["saga_cmd", "--cores=4", "io_gdal", "0"]);
    }

    #[test]
    fn test_execute_with_substitutes_placeholder() {
        let root = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::default();
        let env = Environment::new("/bin/tool_cmd")
            .with_runner(runner.clone())
            .with_temp_root(root.path());

        let output = env
            .library("alpha")
            .tool("beta")
            .execute_with(
                Parameters::new()
                    .with("x", "in.tif")
                    .with("y", ParamValue::temp_with_extension("tif")),
                ExecOptions::default(),
            )
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let tokens = calls[0].tokens();
        assert_eq!(tokens[..6], ["/bin/tool_cmd", "alpha", "beta", "-X", "in.tif", "-Y"]);
        let substituted = PathBuf::from(&tokens[6]);
        assert!(substituted.starts_with(env.temp_dir().unwrap()));
        assert_eq!(substituted.extension().unwrap(), "tif");
        assert!(!substituted.exists());
        assert_eq!(env.temp_files(), vec![substituted.clone()]);
        assert_eq!(output.command(), &calls[0]);
        assert_eq!(output.parameters()[1].value.as_deref(), tokens.get(6).map(String::as_str));
    }

    #[test]
    fn test_prepare_exposes_substitutions() {
        let root = tempfile::tempdir().unwrap();
        let env = Environment::new("saga_cmd").with_temp_root(root.path());
        let call = env
            .tool("ta_morphometry", 0)
            .prepare(
                Parameters::new()
                    .with("elevation", "dem.sdat")
                    .with("slope", ParamValue::temp())
                    .with("unit_slope", 1)
                    .with("verbose", ParamValue::Switch),
            )
            .unwrap();

        let slope = call.substituted("slope").unwrap();
        assert_eq!(Some(slope.to_path_buf()), env.substitution(call.id(), "slope"));
        assert_eq!(call.substituted("elevation"), None);
        assert_eq!(call.get("unit_slope"), Some("1"));
        assert_eq!(call.get("verbose"), None);
        assert_eq!(
            call.command().tokens()[3..],
            [
                "-ELEVATION".to_string(),
                "dem.sdat".to_string(),
                "-SLOPE".to_string(),
                slope.to_string_lossy().into_owned(),
                "-UNIT_SLOPE".to_string(),
                "1".to_string(),
                "-VERBOSE".to_string(),
            ]
        );
        assert!(call.describe().starts_with("ta_morphometry / 0\n    -ELEVATION=dem.sdat"));
    }

    #[test]
    fn test_reference_errors() {
        let env = Environment::new("saga_cmd");
        let call = env
            .tool("grid_tools", "Resampling")
            .prepare(Parameters::new().with("keep_type", ParamValue::Switch))
            .unwrap();
        assert!(matches!(
            call.reference("output"),
            Err(NavigationError::UnknownParameter { param, .. }) if param == "output"
        ));
        assert!(matches!(
            call.reference("keep_type"),
            Err(NavigationError::ValuelessParameter { .. })
        ));
    }

    #[test]
    fn test_command_is_stable_and_comparable() {
        let env = Environment::new("saga_cmd");
        let call = env
            .tool("shapes_grid", 2)
            .prepare(Parameters::new().with("grids", "a.sdat"))
            .unwrap();
        assert_eq!(call.command(), call.command());
        assert_ne!(call.command(), call.tool().command());
    }
}
