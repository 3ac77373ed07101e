// src/core/pipeline_file.rs

use crate::{
    constants::STEP_REF_PREFIX,
    core::{
        environment::Environment,
        identifier::{Identifier, NavigationError},
        parameters::{ParamValue, Parameters},
        pipeline::Pipeline,
        temp_files::TempFileError,
    },
    models::{PipelineFile, StepSpec},
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineFileError {
    #[error("Could not read pipeline file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid pipeline file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Pipeline file declares no steps.")]
    Empty,
    #[error("Step id '{0}' is used more than once.")]
    DuplicateStep(String),
    #[error("Step {step}: '{value}' is not a valid reference, expected '@step.param'.")]
    MalformedReference { step: String, value: String },
    #[error("Step {step}: parameter '{param}' must be a string, number or boolean.")]
    UnsupportedValue { step: String, param: String },
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    TempFile(#[from] TempFileError),
}

/// Reads and parses a pipeline file.
pub fn load_pipeline(path: &Path) -> Result<PipelineFile, PipelineFileError> {
    let content = fs::read_to_string(path).map_err(|source| PipelineFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| PipelineFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Prepares every step of `file` against `env`, resolving `@step.param` references to
/// the values (usually temporary paths) of earlier steps.
///
/// Placeholders are allocated here, so the temp files exist in the environment's
/// bookkeeping even if the pipeline is never executed.
pub fn build_pipeline<'env>(
    env: &'env Environment,
    file: &PipelineFile,
) -> Result<Pipeline<'env>, PipelineFileError> {
    if file.step.is_empty() {
        return Err(PipelineFileError::Empty);
    }

    let mut pipeline = Pipeline::new();
    let mut ids: HashMap<&str, usize> = HashMap::new();

    for (index, spec) in file.step.iter().enumerate() {
        let label = step_label(spec, index);
        let params = resolve_params(spec, &label, &pipeline, &ids)?;
        let library = checked(&spec.library)?;
        let tool = checked(&spec.tool)?;
        let call = env.tool(library, tool).prepare(params)?;

        if let Some(id) = spec.id.as_deref() {
            if ids.insert(id, index).is_some() {
                return Err(PipelineFileError::DuplicateStep(id.to_string()));
            }
        }
        pipeline.push(call);
    }

    log::debug!("Built a pipeline of {} step(s).", pipeline.len());
    Ok(pipeline)
}

fn step_label(spec: &StepSpec, index: usize) -> String {
    match &spec.id {
        Some(id) => format!("'{}'", id),
        None => format!("#{}", index + 1),
    }
}

fn checked(identifier: &Identifier) -> Result<&Identifier, NavigationError> {
    match identifier {
        Identifier::Name(name) if name.trim().is_empty() => Err(NavigationError::EmptyIdentifier),
        _ => Ok(identifier),
    }
}

fn resolve_params(
    spec: &StepSpec,
    label: &str,
    pipeline: &Pipeline<'_>,
    ids: &HashMap<&str, usize>,
) -> Result<Parameters, PipelineFileError> {
    let mut params = Parameters::new();
    for (name, value) in &spec.params {
        let value = match value {
            toml::Value::String(text) => match text.strip_prefix(STEP_REF_PREFIX) {
                Some(reference) => resolve_reference(reference, text, label, pipeline, ids)?,
                None => ParamValue::parse(text),
            },
            toml::Value::Integer(number) => ParamValue::from(number.to_string()),
            toml::Value::Float(number) => ParamValue::from(number.to_string()),
            toml::Value::Boolean(true) => ParamValue::Switch,
            toml::Value::Boolean(false) => continue,
            _ => {
                return Err(PipelineFileError::UnsupportedValue {
                    step: label.to_string(),
                    param: name.clone(),
                });
            }
        };
        params.insert(name.as_str(), value);
    }
    Ok(params)
}

fn resolve_reference(
    reference: &str,
    raw: &str,
    label: &str,
    pipeline: &Pipeline<'_>,
    ids: &HashMap<&str, usize>,
) -> Result<ParamValue, PipelineFileError> {
    let malformed = || PipelineFileError::MalformedReference {
        step: label.to_string(),
        value: raw.to_string(),
    };
    let (step, param) = reference.split_once('.').ok_or_else(malformed)?;
    if step.is_empty() || param.is_empty() {
        return Err(malformed());
    }
    let call = ids
        .get(step)
        .and_then(|&index| pipeline.steps().get(index))
        .ok_or_else(|| NavigationError::UnknownStep(step.to_string()))?;
    Ok(call.reference(param)?)
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::PipelineOptions;
    use crate::system::testing::RecordingRunner;

    const SLOPE_CHAIN: &str = r#"
[[step]]
id = "fill"
library = "ta_preprocessor"
tool = 4
params = { elev = "dem.sdat", filled = "temp.sdat", minslope = 0.1 }

[[step]]
id = "slope"
library = "ta_morphometry"
tool = 0
params = { elevation = "@fill.filled", slope = "temp.sdat", unit_slope = 1 }

[[step]]
library = "shapes_grid"
tool = "Contour Lines from Grid"
params = { grid = "@slope.slope", contour = "temp.shp", polygons = true, lines = false }
"#;

    fn parse(text: &str) -> PipelineFile {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_builds_chain_with_references() {
        let root = tempfile::tempdir().unwrap();
        let env = Environment::new("saga_cmd").with_temp_root(root.path());
        let pipeline = build_pipeline(&env, &parse(SLOPE_CHAIN)).unwrap();

        let steps = pipeline.steps();
        assert_eq!(steps.len(), 3);
        let filled = steps[0].get("filled").unwrap();
        assert!(filled.ends_with(".sdat"));
        assert_eq!(steps[1].get("elevation"), Some(filled));
        assert_eq!(steps[2].get("grid"), steps[1].get("slope"));
        assert_eq!(steps[0].get("minslope"), Some("0.1"));

        let contour = steps[2].command();
        assert_eq!(contour.tokens()[2], "Contour Lines from Grid");
        assert!(contour.tokens().contains(&"-POLYGONS".to_string()));
        assert!(!contour.tokens().contains(&"-LINES".to_string()));
        assert_eq!(env.temp_files().len(), 3);
    }

    #[test]
    fn test_parameter_order_follows_the_file() {
        let env = Environment::new("saga_cmd");
        let file = parse(
            r#"
[[step]]
library = "grid_tools"
tool = 0
params = { zeta = "1", alpha = "2", mid = "3" }
"#,
        );
        let pipeline = build_pipeline(&env, &file).unwrap();
        let names: Vec<&str> = pipeline.steps()[0]
            .parameters()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_forward_reference_is_unknown() {
        let env = Environment::new("saga_cmd");
        let file = parse(
            r#"
[[step]]
library = "a"
tool = 0
params = { input = "@later.output" }

[[step]]
id = "later"
library = "b"
tool = 0
params = { output = "temp" }
"#,
        );
        let err = build_pipeline(&env, &file).unwrap_err();
        assert!(matches!(
            err,
            PipelineFileError::Navigation(NavigationError::UnknownStep(step)) if step == "later"
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let env = Environment::new("saga_cmd");
        let file = parse(
            r#"
[[step]]
id = "x"
library = "a"
tool = 0

[[step]]
id = "x"
library = "a"
tool = 1
"#,
        );
        assert!(matches!(
            build_pipeline(&env, &file),
            Err(PipelineFileError::DuplicateStep(id)) if id == "x"
        ));
    }

    #[test]
    fn test_invalid_values() {
        let env = Environment::new("saga_cmd");
        let malformed = parse(
            "[[step]]\nlibrary = \"a\"\ntool = 0\nparams = { input = \"@nodot\" }\n",
        );
        assert!(matches!(
            build_pipeline(&env, &malformed),
            Err(PipelineFileError::MalformedReference { .. })
        ));

        let array = parse("[[step]]\nlibrary = \"a\"\ntool = 0\nparams = { input = [1, 2] }\n");
        assert!(matches!(
            build_pipeline(&env, &array),
            Err(PipelineFileError::UnsupportedValue { param, .. }) if param == "input"
        ));

        let blank = parse("[[step]]\nlibrary = \" \"\ntool = 0\n");
        assert!(matches!(
            build_pipeline(&env, &blank),
            Err(PipelineFileError::Navigation(NavigationError::EmptyIdentifier))
        ));

        assert!(matches!(
            build_pipeline(&env, &PipelineFile::default()),
            Err(PipelineFileError::Empty)
        ));
    }

    #[test]
    fn test_load_and_run_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slope.toml");
        fs::write(&path, SLOPE_CHAIN).unwrap();

        let runner = RecordingRunner::default().touching_outputs();
        let env = Environment::new("saga_cmd")
            .with_runner(runner.clone())
            .with_temp_root(dir.path());
        let file = load_pipeline(&path).unwrap();
        let outputs = build_pipeline(&env, &file)
            .unwrap()
            .execute(PipelineOptions::default())
            .unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(runner.calls().len(), 3);

        assert!(matches!(
            load_pipeline(&dir.path().join("missing.toml")),
            Err(PipelineFileError::Read { .. })
        ));
    }
}
