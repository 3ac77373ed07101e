// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILENAME};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

lazy_static! {
    static ref CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Failed to expand path template '{template}': {message}")]
    Expansion { template: String, message: String },
}

/// Returns the path to the geochain configuration directory (`~/.config/geochain`).
///
/// The directory is not created; a missing directory simply means "no config file".
/// The first call computes the path, later calls return the cached value.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = CONFIG_DIR.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);
    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path to the `config.toml` file.
pub fn get_config_file_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user-supplied path.
pub fn expand_path_template(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Guesses the extension the external tool gave a file declared without one.
///
/// Among the siblings sharing `path`'s stem: shapefiles win if there are no SAGA grids,
/// SAGA grids win if there are no shapefiles, otherwise the largest file wins.
/// Returns `None` when no sibling matches.
pub fn infer_extension(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let candidates: Vec<(PathBuf, u64)> = fs::read_dir(parent)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.file_stem() == Some(stem) && p.extension().is_some())
        .map(|p| {
            let size = fs::metadata(&p).map(|m| m.len()).unwrap_or(0);
            (p, size)
        })
        .collect();

    let has_extension = |ext: &str| {
        candidates
            .iter()
            .any(|(p, _)| p.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)))
    };
    let has_shp = has_extension("shp");
    let has_sdat = has_extension("sdat");

    let extension = if has_shp && !has_sdat {
        "shp".to_string()
    } else if has_sdat && !has_shp {
        "sdat".to_string()
    } else {
        let (largest, _) = candidates.iter().max_by_key(|(_, size)| *size)?;
        largest.extension()?.to_string_lossy().into_owned()
    };

    log::debug!("Inferred extension '{}' for '{}'.", extension, path.display());
    Some(path.with_extension(extension))
}
