//! # Config Loader
//!
//! Reads `config.toml` from the geochain config directory and layers the environment
//! variable overrides on top. A missing file is the same as an empty one.
use crate::{
    constants::{SAGA_CMD_ENV_VAR, TEMP_ROOT_ENV_VAR},
    core::paths::{self, PathError},
    models::Config,
};
use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Loads the user configuration with environment overrides applied.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = paths::get_config_file_path()?;
    let config = load_config_from(&path)?;
    Ok(apply_env_overrides(config, |name| env::var(name).ok()))
}

/// Loads `path` without looking at environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("No config file at '{}', using defaults.", path.display());
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    log::debug!("Loading config from '{}'.", path.display());
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    if let Some(saga_cmd) = non_blank(SAGA_CMD_ENV_VAR) {
        log::debug!("{} overrides the configured binary.", SAGA_CMD_ENV_VAR);
        config.saga_cmd = Some(saga_cmd);
    }
    if let Some(temp_root) = non_blank(TEMP_ROOT_ENV_VAR) {
        config.temp_root = Some(temp_root);
    }
    config
}
