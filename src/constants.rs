// src/constants.rs

/// The name of the directory holding geochain configuration (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "geochain";

/// The name of the configuration file (inside the config directory).
pub const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable overriding the path to the external binary.
pub const SAGA_CMD_ENV_VAR: &str = "GEOCHAIN_SAGA_CMD";

/// Environment variable overriding the root under which temp directories are created.
pub const TEMP_ROOT_ENV_VAR: &str = "GEOCHAIN_TEMP_ROOT";

/// Prefix of the per-session temporary directory.
pub const TEMP_DIR_PREFIX: &str = "geochain-";

/// File stem that marks a parameter value as "allocate a throwaway file".
pub const PLACEHOLDER_STEM: &str = "temp";

/// Prefix put in front of a flag value that does not carry one already.
pub const FLAG_PREFIX: &str = "--";

/// Prefix put in front of every upper-cased parameter name.
pub const PARAM_PREFIX: &str = "-";

/// Flag that makes the binary print its version.
pub const VERSION_FLAG: &str = "version";

/// Prefix of a pipeline-file value that references an earlier step (`@step.param`).
pub const STEP_REF_PREFIX: char = '@';

/// Library and tool that list the file formats the GDAL driver can read and write.
pub const GDAL_LIBRARY: &str = "io_gdal";
pub const GDAL_FORMATS_TOOL: usize = 10;

/// First major version whose GDAL driver can list its formats.
pub const GDAL_FORMATS_MIN_MAJOR: u32 = 4;
