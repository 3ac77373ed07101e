// src/system/discovery.rs

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How deep install directories are walked.
const MAX_SEARCH_DEPTH: usize = 4;

/// Finds the tool-suite binary on the host.
pub trait BinaryLocator: fmt::Debug {
    fn locate(&self) -> Option<PathBuf>;

    /// What is being looked for, for error messages.
    fn target(&self) -> String;
}

/// Looks the binary up on `PATH`, then walks a list of install directories.
#[derive(Debug, Clone)]
pub struct SearchLocator {
    file_name: String,
    search_path: bool,
    dirs: Vec<PathBuf>,
}

impl SearchLocator {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            search_path: true,
            dirs: Vec::new(),
        }
    }

    /// The binary name and usual install locations of the current platform.
    pub fn for_current_platform() -> Self {
        let (file_name, dirs): (&str, &[&str]) = if cfg!(target_os = "windows") {
            (
                "saga_cmd.exe",
                &[
                    "C:/Program Files/SAGA-GIS",
                    "C:/Program Files (x86)/SAGA-GIS",
                    "C:/SAGA-GIS",
                    "C:/OSGeo4W",
                    "C:/OSGeo4W64",
                ],
            )
        } else if cfg!(target_os = "macos") {
            (
                "saga_cmd",
                &[
                    "/Applications/SAGA.app/Contents/MacOS",
                    "/usr/local/bin",
                    "/Applications/QGIS.app/Contents/MacOS/bin",
                ],
            )
        } else {
            ("saga_cmd", &["/usr/bin", "/usr/local/bin", "/usr", "/usr/local"])
        };
        Self::new(file_name).with_dirs(dirs.iter().map(PathBuf::from))
    }

    /// Adds directories to walk after the built-in ones.
    pub fn with_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }

    fn search_path_var(&self) -> Option<PathBuf> {
        let path_var = env::var_os("PATH")?;
        env::split_paths(&path_var)
            .map(|dir| dir.join(&self.file_name))
            .find(|candidate| is_executable(candidate))
    }

    fn search_dirs(&self) -> Option<PathBuf> {
        self.dirs
            .iter()
            .filter(|dir| dir.is_dir())
            .find_map(|dir| {
                log::trace!("Searching '{}' for {}", dir.display(), self.file_name);
                WalkDir::new(dir)
                    .max_depth(MAX_SEARCH_DEPTH)
                    .into_iter()
                    .filter_map(Result::ok)
                    .find(|entry| {
                        entry.file_name().to_string_lossy() == self.file_name
                            && is_executable(entry.path())
                    })
                    .map(walkdir::DirEntry::into_path)
            })
    }
}

impl BinaryLocator for SearchLocator {
    fn locate(&self) -> Option<PathBuf> {
        let found = if self.search_path {
            self.search_path_var().or_else(|| self.search_dirs())
        } else {
            self.search_dirs()
        }?;
        Some(dunce::canonicalize(&found).unwrap_or(found))
    }

    fn target(&self) -> String {
        self.file_name.clone()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// MARK: --- UNIT TESTS ---
