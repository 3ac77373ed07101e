// src/core/pipeline.rs

use crate::{
    core::{output::Output, tool::ToolCall},
    system::executor::{ExecOptions, ExecutionError},
};
use colored::Colorize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline step {} ('{}') exited with {}.\n{}", .index + 1, .output.command(), .output.status_label(), .output.diagnostics())]
    StepFailed {
        /// Zero-based position of the failing step.
        index: usize,
        output: Box<Output>,
        completed: Vec<Output>,
    },
    #[error("Pipeline step {} could not be executed: {source}", .index + 1)]
    StepError {
        index: usize,
        #[source]
        source: ExecutionError,
        completed: Vec<Output>,
    },
}

impl PipelineError {
    pub fn index(&self) -> usize {
        match self {
            Self::StepFailed { index, .. } | Self::StepError { index, .. } => *index,
        }
    }

    /// Outputs of the steps that ran before the failure.
    pub fn completed(&self) -> &[Output] {
        match self {
            Self::StepFailed { completed, .. } | Self::StepError { completed, .. } => completed,
        }
    }

    /// The captured output of the failing step, if it ran at all.
    pub fn output(&self) -> Option<&Output> {
        match self {
            Self::StepFailed { output, .. } => Some(output),
            Self::StepError { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub exec: ExecOptions,
    /// Run the remaining steps after a non-zero exit instead of stopping.
    pub keep_going: bool,
}

/// An ordered sequence of prepared calls run one after another.
///
/// Steps only share data through the paths their parameters carry; there is no
/// piping of standard streams between them.
#[derive(Debug, Clone, Default)]
pub struct Pipeline<'env> {
    steps: Vec<ToolCall<'env>>,
}

impl<'env> Pipeline<'env> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `next`, whether a single call or a whole pipeline.
    /// `(a.then(b)).then(c)` and `a.then(b.then(c))` hold the same steps.
    pub fn then(mut self, next: impl Into<Pipeline<'env>>) -> Self {
        self.steps.extend(next.into().steps);
        self
    }

    pub fn push(&mut self, step: ToolCall<'env>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[ToolCall<'env>] {
        &self.steps
    }

    /// Runs every step in order and returns their outputs.
    ///
    /// A step with a non-zero exit stops the pipeline (unless `keep_going`) and no
    /// later step is invoked. Temporary files are never removed here.
    pub fn execute(&self, options: PipelineOptions) -> Result<Vec<Output>, PipelineError> {
        let total = self.steps.len();
        let exec = ExecOptions {
            strict: false,
            ..options.exec
        };
        let mut outputs = Vec::with_capacity(total);

        for (index, step) in self.steps.iter().enumerate() {
            log::info!("Step {}/{}: {}", index + 1, total, step.tool().label());
            if options.exec.verbose {
                println!("{} {}", "→".blue(), step.describe().green());
            }

            let output = match step.execute(exec) {
                Ok(output) => output,
                Err(source) => {
                    return Err(PipelineError::StepError {
                        index,
                        source,
                        completed: outputs,
                    });
                }
            };

            if !output.success() {
                if !options.keep_going {
                    return Err(PipelineError::StepFailed {
                        index,
                        output: Box::new(output),
                        completed: outputs,
                    });
                }
                log::warn!(
                    "Step {} exited with {}, continuing.",
                    index + 1,
                    output.status_label()
                );
            }
            outputs.push(output);
        }

        Ok(outputs)
    }
}

impl<'env> From<ToolCall<'env>> for Pipeline<'env> {
    fn from(step: ToolCall<'env>) -> Self {
        Self { steps: vec![step] }
    }
}

impl<'env> FromIterator<ToolCall<'env>> for Pipeline<'env> {
    fn from_iter<I: IntoIterator<Item = ToolCall<'env>>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        environment::Environment,
        parameters::{ParamValue, Parameters},
    };
    use crate::system::testing::RecordingRunner;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn env_with(runner: &RecordingRunner, root: &tempfile::TempDir) -> Environment {
        Environment::new("saga_cmd")
            .with_runner(runner.clone())
            .with_temp_root(root.path())
    }

    #[test]
    fn test_three_step_chain_runs_in_order_with_distinct_paths() {
        let root = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::default().touching_outputs();
        let env = env_with(&runner, &root);

        let fill = env
            .tool("ta_preprocessor", 4)
            .prepare(
                Parameters::new()
                    .with("elev", "dem.sdat")
                    .with("filled", ParamValue::temp_with_extension("sdat")),
            )
            .unwrap();
        let slope = env
            .tool("ta_morphometry", 0)
            .prepare(
                Parameters::new()
                    .with("elevation", fill.reference("filled").unwrap())
                    .with("slope", ParamValue::temp_with_extension("sdat")),
            )
            .unwrap();
        let contour = env
            .tool("shapes_grid", 5)
            .prepare(
                Parameters::new()
                    .with("grid", slope.reference("slope").unwrap())
                    .with("contour", ParamValue::temp_with_extension("shp")),
            )
            .unwrap();

        let filled = fill.get("filled").unwrap().to_string();
        let sloped = slope.get("slope").unwrap().to_string();
        let pipeline = fill.then(slope).then(contour);
        assert_eq!(pipeline.len(), 3);

        let outputs = pipeline.execute(PipelineOptions::default()).unwrap();
        assert_eq!(outputs.len(), 3);

        let calls = runner.calls();
        let libraries: Vec<&str> = calls.iter().map(|c| c.tokens()[1].as_str()).collect();
        assert_eq!(libraries, ["ta_preprocessor", "ta_morphometry", "shapes_grid"]);
        assert!(calls[1].tokens().contains(&filled));
        assert!(calls[2].tokens().contains(&sloped));

        let temps: HashSet<PathBuf> = env.temp_files().into_iter().collect();
        assert_eq!(temps.len(), 3);
        assert!(temps.iter().all(|p| p.is_file()));
    }

    #[test]
    fn test_failing_step_stops_the_chain() {
        let root = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::default().failing_on("B");
        let env = env_with(&runner, &root);
        let step = |name: &str| env.tool("lib", name).prepare(Parameters::new()).unwrap();

        let pipeline = step("A").then(step("B")).then(step("C"));
        let err = pipeline.execute(PipelineOptions::default()).unwrap_err();

        assert_eq!(err.index(), 1);
        assert_eq!(err.completed().len(), 1);
        assert_eq!(err.output().and_then(Output::status), Some(1));
        let invoked: Vec<String> = runner.calls().iter().map(|c| c.tokens()[2].clone()).collect();
        assert_eq!(invoked, ["A", "B"]);
    }

    #[test]
    fn test_keep_going_runs_every_step() {
        let root = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::default().failing_on("B");
        let env = env_with(&runner, &root);
        let step = |name: &str| env.tool("lib", name).prepare(Parameters::new()).unwrap();

        let pipeline: Pipeline<'_> = ["A", "B", "C"].into_iter().map(step).collect();
        let outputs = pipeline
            .execute(PipelineOptions {
                keep_going: true,
                ..Default::default()
            })
            .unwrap();
        let statuses: Vec<Option<i32>> = outputs.iter().map(Output::status).collect();
        assert_eq!(statuses, [Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_then_is_associative() {
        let env = Environment::new("saga_cmd");
        let step = |name: &str| env.tool("lib", name).prepare(Parameters::new()).unwrap();
        let (a, b, c) = (step("a"), step("b"), step("c"));

        let left = a.clone().then(b.clone()).then(c.clone());
        let right = a.then(b.then(c));
        let ids = |p: &Pipeline<'_>| p.steps().iter().map(ToolCall::id).collect::<Vec<_>>();
        assert_eq!(ids(&left), ids(&right));
    }

    #[test]
    fn test_temp_files_survive_pipeline_until_cleanup() {
        let root = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::default().touching_outputs();
        let env = env_with(&runner, &root);
        let first = env
            .tool("grid_tools", 0)
            .prepare(Parameters::new().with("output", ParamValue::temp_with_extension("sdat")))
            .unwrap();
        let second = env
            .tool("grid_tools", 1)
            .prepare(Parameters::new().with("input", first.reference("output").unwrap()))
            .unwrap();

        first.then(second).execute(PipelineOptions::default()).unwrap();
        let files = env.temp_files();
        assert!(files.iter().all(|f| f.is_file()));

        env.cleanup().unwrap();
        assert!(files.iter().all(|f| !f.exists()));
        env.cleanup().unwrap();
    }

    #[test]
    fn test_empty_pipeline_is_a_no_op() {
        let outputs = Pipeline::new().execute(PipelineOptions::default()).unwrap();
        assert!(outputs.is_empty());
    }
}
