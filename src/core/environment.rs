// src/core/environment.rs

use crate::{
    constants::{
        GDAL_FORMATS_MIN_MAJOR, GDAL_FORMATS_TOOL, GDAL_LIBRARY, TEMP_DIR_PREFIX, VERSION_FLAG,
    },
    core::{
        command::{Command, Flag},
        executable::Executable,
        identifier::Identifier,
        library::Library,
        output::{self, Formats, Output},
        parameters::{Parameters, ResolvedParam},
        temp_files::{TempFileError, TempFiles},
        tool::Tool,
    },
    system::{
        discovery::BinaryLocator,
        executor::{ExecOptions, ExecutionError, ProcessRunner, SystemRunner},
    },
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

lazy_static! {
    static ref VERSION_RE: Regex =
        Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("version pattern is valid");
}

/// `MAJOR.MINOR.PATCH` of the wrapped binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Finds the first `X.Y.Z` in free text.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(text)?;
        let part = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
        Some(Self {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// The root handle to the tool suite.
///
/// Owns the path to the binary, the flag inherited by every library and tool
/// navigated from it, the process runner, and the temporary files handed out to
/// placeholder parameters. Temporary files outlive every call until
/// [`Environment::cleanup`] is invoked.
///
/// Not thread-safe: the temp-file bookkeeping assumes a single writer.
#[derive(Debug)]
pub struct Environment {
    path: PathBuf,
    flag: Flag,
    runner: Box<dyn ProcessRunner>,
    temp: RefCell<TempFiles>,
    formats: RefCell<Option<Formats>>,
}

impl Environment {
    /// Wraps the binary at `path` without touching the filesystem. A wrong path
    /// surfaces as [`ExecutionError::ExecutableNotFound`] on first execution.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flag: Flag::default(),
            runner: Box::new(SystemRunner),
            temp: RefCell::new(TempFiles::default()),
            formats: RefCell::new(None),
        }
    }

    /// Like [`Environment::new`], but fails right away unless `path` is an existing file.
    pub fn checked(path: impl AsRef<Path>) -> Result<Self, ExecutionError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ExecutionError::ExecutableNotFound(
                path.display().to_string(),
            ));
        }
        let canonical = dunce::canonicalize(path)
            .map_err(|e| ExecutionError::CommandFailed(path.display().to_string(), e))?;
        Ok(Self::new(canonical))
    }

    /// Asks `locator` for the binary.
    pub fn locate(locator: &dyn BinaryLocator) -> Result<Self, ExecutionError> {
        match locator.locate() {
            Some(path) => {
                log::debug!("Binary located at '{}'.", path.display());
                Ok(Self::new(path))
            }
            None => Err(ExecutionError::ExecutableNotFound(locator.target())),
        }
    }

    pub fn with_runner(mut self, runner: impl ProcessRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Creates the temporary directory under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp = RefCell::new(TempFiles::new(Some(root.into())));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The program token of every command.
    pub fn program(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Navigates to a library. Nothing is validated against the binary.
    pub fn library(&self, id: impl Into<Identifier>) -> Library<'_> {
        Library::new(self, id.into())
    }

    /// Shortcut for `self.library(library).tool(tool)`.
    pub fn tool(&self, library: impl Into<Identifier>, tool: impl Into<Identifier>) -> Tool<'_> {
        self.library(library).tool(tool)
    }

    /// The temporary directory, created on first use.
    pub fn temp_dir(&self) -> Result<PathBuf, TempFileError> {
        self.temp.borrow_mut().dir()
    }

    /// Every temporary file handed out and not yet cleaned up.
    pub fn temp_files(&self) -> Vec<PathBuf> {
        self.temp.borrow().files().to_vec()
    }

    /// The path substituted for `param` in the call identified by `call`.
    pub fn substitution(&self, call: Uuid, param: &str) -> Option<PathBuf> {
        self.temp
            .borrow()
            .substitution(call, param)
            .map(Path::to_path_buf)
    }

    pub(crate) fn allocate_temp(
        &self,
        call: Uuid,
        param: &str,
        extension: Option<&str>,
    ) -> Result<PathBuf, TempFileError> {
        self.temp.borrow_mut().allocate(call, param, extension)
    }

    /// Deletes every temporary file handed out so far. Never called implicitly.
    pub fn cleanup(&self) -> Result<usize, TempFileError> {
        let removed = self.temp.borrow_mut().cleanup()?;
        log::debug!("Cleanup removed {} temporary file(s).", removed);
        Ok(removed)
    }

    /// Runs the binary with the `version` flag and parses its answer.
    /// The environment's own flag is left untouched.
    pub fn version(&self) -> Result<Option<Version>, ExecutionError> {
        let command = Command::compose(
            self.program(),
            &Flag::new(VERSION_FLAG),
            Vec::<String>::new(),
        );
        let output = self.run(command, Vec::new(), ExecOptions::default())?;
        let version = Version::parse(output.text()).or_else(|| Version::parse(output.stderr()));
        if version.is_none() {
            log::warn!(
                "Could not parse a version from the output of '{}'.",
                output.command()
            );
        }
        Ok(version)
    }

    /// The raster and vector extensions the installed binary can read and write.
    ///
    /// Asked once through the GDAL driver's format listing and cached. Binaries older
    /// than major version 4, or a listing that fails, fall back to [`Formats::builtin`].
    pub fn formats(&self) -> Formats {
        if let Some(formats) = self.formats.borrow().as_ref() {
            return formats.clone();
        }
        let formats = self.query_formats();
        *self.formats.borrow_mut() = Some(formats.clone());
        formats
    }

    fn query_formats(&self) -> Formats {
        match self.version() {
            Ok(Some(version)) if version.major >= GDAL_FORMATS_MIN_MAJOR => {}
            Ok(Some(version)) => {
                log::debug!("Version {} cannot list its formats.", version);
                return Formats::builtin();
            }
            Ok(None) => return Formats::builtin(),
            Err(e) => {
                log::warn!("Could not query the version for the format listing: {}", e);
                return Formats::builtin();
            }
        }
        Formats::reported(self.query_gdal_formats("0"), self.query_gdal_formats("1"))
    }

    /// Runs the format listing for one data type (`0` raster, `1` vector).
    fn query_gdal_formats(&self, data_type: &str) -> Option<BTreeSet<String>> {
        let listing = match tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .suffix(".txt")
            .tempfile()
        {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Could not create the format listing file: {}", e);
                return None;
            }
        };
        let params = Parameters::new()
            .with("formats", listing.path())
            .with("acces", 2)
            .with("recognized", 1)
            .with("type", data_type);
        let tool = self.tool(GDAL_LIBRARY, GDAL_FORMATS_TOOL);
        if let Err(e) = tool.execute_with(params, ExecOptions::default().strict()) {
            log::warn!("Format listing of {} failed: {}", tool.label(), e);
            return None;
        }

        let found = match fs::read(listing.path()) {
            Ok(bytes) => output::parse_format_listing(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                log::warn!("Could not read the format listing: {}", e);
                return None;
            }
        };
        if found.is_empty() {
            log::warn!("The format listing of type {} named no extensions.", data_type);
            return None;
        }
        log::debug!("Type {} formats: {:?}", data_type, found);
        Some(found)
    }

    /// Executes `command` through the runner and wraps the result.
    pub(crate) fn run(
        &self,
        command: Command,
        parameters: Vec<ResolvedParam>,
        options: ExecOptions,
    ) -> Result<Output, ExecutionError> {
        let raw = self.runner.run(&command, options.verbose)?;
        let output = Output::new(command, raw, parameters);
        if !output.success() {
            log::debug!(
                "'{}' finished with {}.",
                output.command(),
                output.status_label()
            );
        }
        if options.strict {
            output.check()
        } else {
            Ok(output)
        }
    }
}

impl Executable for Environment {
    fn environment(&self) -> &Environment {
        self
    }

    fn flag(&self) -> &Flag {
        &self.flag
    }

    fn flag_mut(&mut self) -> &mut Flag {
        &mut self.flag
    }

    fn identifiers(&self) -> Vec<String> {
        Vec::new()
    }
}

// MARK: --- UNIT TESTS ---
