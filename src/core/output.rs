// src/core/output.rs

use crate::{
    core::{command::Command, parameters::ResolvedParam, paths},
    system::executor::{ExecutionError, RawOutput},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref EXTENSION_RE: Regex = Regex::new(r"\.(\w+)").expect("extension pattern is valid");
}

/// Native grid extensions, never part of the GDAL listing.
const NATIVE_RASTER_EXTENSIONS: &[&str] = &["sdat", "sgrd", "sg-grd", "sg-grd-z"];

/// Extensions the tool suite reads and writes as grids.
const RASTER_EXTENSIONS: &[&str] = &[
    "sdat", "sgrd", "sg-grd", "sg-grd-z", "tif", "tiff", "asc", "img", "nc", "vrt", "bil", "dem",
    "grd", "xyz", "jp2", "png",
];

/// Extensions the tool suite reads and writes as vector layers.
const VECTOR_EXTENSIONS: &[&str] = &[
    "shp", "gpkg", "geojson", "json", "kml", "gml", "gpx", "dxf", "sqlite", "fgb",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Raster,
    Vector,
    Other,
}

/// The extensions recognized as grids and as vector layers.
///
/// [`Formats::builtin`] is a fixed list; [`Environment::formats`](crate::core::environment::Environment::formats)
/// asks the installed binary instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formats {
    raster: BTreeSet<String>,
    vector: BTreeSet<String>,
}

impl Formats {
    /// Extensions are stored lower-cased and without a leading dot.
    pub fn new<R, V>(raster: R, vector: V) -> Self
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<str>,
    {
        Self {
            raster: normalize(raster),
            vector: normalize(vector),
        }
    }

    pub fn builtin() -> Self {
        Self::new(RASTER_EXTENSIONS, VECTOR_EXTENSIONS)
    }

    /// Sets reported by the binary. A missing set falls back to the built-in list;
    /// native grids are always rasters.
    pub fn reported(raster: Option<BTreeSet<String>>, vector: Option<BTreeSet<String>>) -> Self {
        let builtin = Self::builtin();
        let raster = raster.map_or(builtin.raster, |found| {
            let mut set = normalize(found);
            set.extend(NATIVE_RASTER_EXTENSIONS.iter().map(|e| (*e).to_string()));
            set
        });
        let vector = vector.map_or(builtin.vector, normalize);
        Self { raster, vector }
    }

    pub fn raster(&self) -> &BTreeSet<String> {
        &self.raster
    }

    pub fn vector(&self) -> &BTreeSet<String> {
        &self.vector
    }

    pub fn kind_of(&self, path: &Path) -> ArtifactKind {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if self.raster.contains(&extension) {
            ArtifactKind::Raster
        } else if self.vector.contains(&extension) {
            ArtifactKind::Vector
        } else {
            ArtifactKind::Other
        }
    }
}

impl Default for Formats {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize<I>(extensions: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Reads the extensions out of a tab-separated format listing: the third column of
/// its last row, e.g. `GeoTIFF (*.tif, *.tiff)`.
pub fn parse_format_listing(listing: &str) -> BTreeSet<String> {
    let Some(row) = listing.lines().rev().find(|line| !line.trim().is_empty()) else {
        return BTreeSet::new();
    };
    row.split('\t')
        .nth(2)
        .map(|column| {
            EXTENSION_RE
                .captures_iter(column)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_lowercase())
                .collect()
        })
        .unwrap_or_default()
}

/// A file that one of the call's parameters points to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn classify(path: PathBuf, formats: &Formats) -> Self {
        let kind = formats.kind_of(&path);
        Self { path, kind }
    }
}

/// Decodes an artifact into something a caller can inspect (a grid, a layer...).
/// Implementations live outside this crate.
pub trait ArtifactRenderer {
    type Rendered;
    type Error: std::error::Error + 'static;

    fn render(&self, artifact: &Artifact) -> Result<Self::Rendered, Self::Error>;
}

#[derive(Error, Debug)]
pub enum RenderError<E: std::error::Error + 'static> {
    #[error("Parameter '{0}' does not point to a file produced by this call.")]
    MissingArtifact(String),
    #[error(transparent)]
    Renderer(E),
}

/// An immutable snapshot of one execution: what ran, how it ended and what it printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    command: Command,
    status: Option<i32>,
    stdout: String,
    stderr: String,
    parameters: Vec<ResolvedParam>,
}

impl Output {
    pub fn new(command: Command, raw: RawOutput, parameters: Vec<ResolvedParam>) -> Self {
        Self {
            command,
            status: raw.status,
            stdout: raw.stdout,
            stderr: raw.stderr,
            parameters,
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// The exit code; `None` if the process was killed by a signal.
    pub fn status(&self) -> Option<i32> {
        self.status
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Captured standard output.
    pub fn text(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// The parameters of the call, after placeholder substitution.
    pub fn parameters(&self) -> &[ResolvedParam] {
        &self.parameters
    }

    pub fn status_label(&self) -> String {
        match self.status {
            Some(code) => format!("exit code {}", code),
            None => "no exit code (terminated by a signal)".to_string(),
        }
    }

    /// The most useful text for diagnosing a failure: stderr, or stdout when stderr is empty.
    /// Tools of this suite often print their usage on stdout.
    pub fn diagnostics(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }

    /// Strict view: a failed run becomes [`ExecutionError::NonZeroExit`].
    pub fn check(self) -> Result<Self, ExecutionError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ExecutionError::NonZeroExit {
                command: self.command.to_string(),
                output: Box::new(self),
            })
        }
    }

    /// The file a parameter points to, if it exists, classified with the built-in list.
    ///
    /// A declared path without extension is matched against the files the tool wrote
    /// next to it (`dem` becomes `dem.sdat`).
    pub fn file(&self, param: &str) -> Option<Artifact> {
        self.parameters
            .iter()
            .find(|p| p.name == param)
            .and_then(|p| p.value.as_deref())
            .and_then(|value| locate_artifact(Path::new(value), &Formats::builtin()))
    }

    /// Every parameter that points to an existing file, in parameter order.
    pub fn files(&self) -> Vec<(String, Artifact)> {
        self.files_with(&Formats::builtin())
    }

    pub fn files_with(&self, formats: &Formats) -> Vec<(String, Artifact)> {
        self.parameters
            .iter()
            .filter_map(|p| {
                let value = p.value.as_deref()?;
                locate_artifact(Path::new(value), formats)
                    .map(|artifact| (p.name.clone(), artifact))
            })
            .collect()
    }

    pub fn rasters(&self, formats: &Formats) -> Vec<(String, Artifact)> {
        self.files_of_kind(ArtifactKind::Raster, formats)
    }

    pub fn vectors(&self, formats: &Formats) -> Vec<(String, Artifact)> {
        self.files_of_kind(ArtifactKind::Vector, formats)
    }

    fn files_of_kind(&self, kind: ArtifactKind, formats: &Formats) -> Vec<(String, Artifact)> {
        self.files_with(formats)
            .into_iter()
            .filter(|(_, artifact)| artifact.kind == kind)
            .collect()
    }

    /// Hands the artifact behind `param` to `renderer`.
    pub fn render_with<R: ArtifactRenderer>(
        &self,
        renderer: &R,
        param: &str,
    ) -> Result<R::Rendered, RenderError<R::Error>> {
        let artifact = self
            .file(param)
            .ok_or_else(|| RenderError::MissingArtifact(param.to_string()))?;
        renderer.render(&artifact).map_err(RenderError::Renderer)
    }
}

fn locate_artifact(path: &Path, formats: &Formats) -> Option<Artifact> {
    if path.is_file() {
        return Some(Artifact::classify(path.to_path_buf(), formats));
    }
    if path.extension().is_none() {
        return paths::infer_extension(path)
            .filter(|inferred| inferred.is_file())
            .map(|inferred| Artifact::classify(inferred, formats));
    }
    None
}

// MARK: --- UNIT TESTS ---
