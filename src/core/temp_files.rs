// src/core/temp_files.rs

use crate::constants::TEMP_DIR_PREFIX;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TempFileError {
    #[error("Could not create temporary directory under '{}': {source}", .root.display())]
    DirCreation {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not remove temporary file '{}': {source}", .path.display())]
    Removal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Bookkeeping for the throwaway files handed out to placeholder parameters.
///
/// The directory is created on first allocation and files are never deleted until
/// [`TempFiles::cleanup`] is called, so a chain of calls can pass them along freely.
#[derive(Debug, Default)]
pub struct TempFiles {
    root: Option<PathBuf>,
    dir: Option<PathBuf>,
    files: Vec<PathBuf>,
    substitutions: HashMap<(Uuid, String), PathBuf>,
}

impl TempFiles {
    /// `root` is where the session directory is created; `None` means the system temp dir.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    /// Returns the session directory, creating it on first use.
    pub fn dir(&mut self) -> Result<PathBuf, TempFileError> {
        if let Some(dir) = &self.dir {
            if dir.is_dir() {
                return Ok(dir.clone());
            }
            log::debug!("Temporary directory '{}' vanished, recreating.", dir.display());
        }

        let root = self.root.clone().unwrap_or_else(std::env::temp_dir);
        let creation_error = |source| TempFileError::DirCreation {
            root: root.clone(),
            source,
        };
        fs::create_dir_all(&root).map_err(creation_error)?;
        let dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir_in(&root)
            .map_err(creation_error)?
            .keep();

        log::debug!("Created temporary directory '{}'.", dir.display());
        self.dir = Some(dir.clone());
        Ok(dir)
    }

    /// The session directory, if it has been created.
    pub fn current_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Hands out a fresh path for `param` of call `call` and records the substitution.
    ///
    /// The file itself is not created; the external tool writes it.
    pub fn allocate(
        &mut self,
        call: Uuid,
        param: &str,
        extension: Option<&str>,
    ) -> Result<PathBuf, TempFileError> {
        let dir = self.dir()?;
        let stem = sanitize(param);
        let suffix = extension
            .map(|ext| ext.trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let path = loop {
            let candidate = dir.join(format!("{}_{}{}", stem, Uuid::new_v4().simple(), suffix));
            if !candidate.exists() && !self.files.contains(&candidate) {
                break candidate;
            }
        };

        log::debug!("Allocated '{}' for parameter '{}'.", path.display(), param);
        self.files.push(path.clone());
        self.substitutions
            .insert((call, param.to_string()), path.clone());
        Ok(path)
    }

    /// The path substituted for `param` in call `call`, if any.
    pub fn substitution(&self, call: Uuid, param: &str) -> Option<&Path> {
        self.substitutions
            .get(&(call, param.to_string()))
            .map(PathBuf::as_path)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Deletes every tracked file together with the sidecars the external tool wrote
    /// next to it (same unique stem), then drops the directory if it is left empty.
    ///
    /// Missing files are not errors, so calling this twice is harmless. Files that
    /// could not be removed stay tracked and the first failure is returned.
    pub fn cleanup(&mut self) -> Result<usize, TempFileError> {
        let mut removed = 0;
        let mut failed = Vec::new();
        let mut first_error = None;

        for path in std::mem::take(&mut self.files) {
            match remove_with_sidecars(&path) {
                Ok(count) => removed += count,
                Err(source) => {
                    log::warn!("Failed to remove '{}': {}", path.display(), source);
                    if first_error.is_none() {
                        first_error = Some(TempFileError::Removal {
                            path: path.clone(),
                            source,
                        });
                    }
                    failed.push(path);
                }
            }
        }

        self.substitutions.retain(|_, path| failed.contains(path));
        self.files = failed;

        if self.files.is_empty() {
            if let Some(dir) = self.dir.take() {
                match fs::remove_dir(&dir) {
                    Ok(()) => log::debug!("Removed temporary directory '{}'.", dir.display()),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        // Something else lives there; keep using it.
                        log::debug!("Keeping temporary directory '{}': {}", dir.display(), e);
                        self.dir = Some(dir);
                    }
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(removed),
        }
    }
}

/// Removes `path` and its siblings named `<stem>.*`. Returns how many files went away.
fn remove_with_sidecars(path: &Path) -> std::io::Result<usize> {
    let mut removed = remove_if_present(path)?;

    let (Some(parent), Some(stem)) = (path.parent(), path.file_stem()) else {
        return Ok(removed);
    };
    let sidecar_prefix = format!("{}.", stem.to_string_lossy());
    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(removed),
        Err(e) => return Err(e),
    };
    for entry in entries {
        let sibling = entry?.path();
        let is_sidecar = sibling
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with(&sidecar_prefix));
        if is_sidecar && sibling.is_file() {
            removed += remove_if_present(&sibling)?;
        }
    }
    Ok(removed)
}

fn remove_if_present(path: &Path) -> std::io::Result<usize> {
    match fs::remove_file(path) {
        Ok(()) => Ok(1),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}

/// Keeps parameter names usable as file names.
fn sanitize(param: &str) -> String {
    let cleaned: String = param
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "param".to_string()
    } else {
        cleaned
    }
}

// MARK: --- UNIT TESTS ---
