// src/models.rs

use crate::core::identifier::Identifier;
use serde::{Deserialize, Serialize};

// --- USER CONFIGURATION ---

/// Contents of `config.toml`. Every field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the binary. Skips discovery when set.
    pub saga_cmd: Option<String>,
    /// Where temporary directories are created instead of the system temp dir.
    pub temp_root: Option<String>,
    /// Extra directories searched for the binary.
    pub search_dirs: Vec<String>,
    /// Flag applied to the environment on startup.
    pub flag: Option<String>,
}

// --- PIPELINE FILES ---

/// A pipeline declared in TOML as a list of `[[step]]` tables.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipelineFile {
    #[serde(default)]
    pub step: Vec<StepSpec>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    /// Name other steps use to reference this one (`@id.param`).
    pub id: Option<String>,
    pub library: Identifier,
    pub tool: Identifier,
    #[serde(default)]
    pub params: toml::Table,
}
