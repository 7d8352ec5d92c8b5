//! Generator configuration (`crudgen.yaml`).
//!
//! ```yaml
//! database:
//!   host: localhost
//!   user: dev
//!   database: telemedicina
//!   connect_timeout_secs: 5
//! file:
//!   schema_dir: schemas
//! templates:
//!   dir: my-templates
//! output:
//!   root: generated
//!   module: true
//! snippets:
//!   pagination_query: "LIMIT ? OFFSET ?"
//! ```
//!
//! Every section is optional. JSON files parse too.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::context::Snippets;
use crate::source::DatabaseConfig;

pub const DEFAULT_SCHEMA_DIR: &str = "schemas";
pub const DEFAULT_OUTPUT_ROOT: &str = "generated";

fn default_schema_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SCHEMA_DIR)
}

fn default_output_root() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_ROOT)
}

/// Error type for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "Failed to parse {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Top-level generator configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Database connection; unset fields fall back to the environment
    pub database: Option<DatabaseConfig>,
    pub file: FileConfig,
    pub templates: TemplatesConfig,
    pub output: OutputConfig,
    pub snippets: Snippets,
}

/// File schema source settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Explicit schema file; wins over `schema_dir`
    pub path: Option<PathBuf>,
    /// Directory holding `<table>.json` files
    pub schema_dir: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        FileConfig {
            path: None,
            schema_dir: default_schema_dir(),
        }
    }
}

/// Template settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    /// Directory of `<id>.rs.j2` templates
    pub dir: Option<PathBuf>,
    /// Use only the directory's templates instead of overlaying the built-in set
    pub standalone: bool,
}

/// Output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Generation root directory
    pub root: PathBuf,
    /// Emit the module aggregator alongside `all`
    pub module: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            root: default_output_root(),
            module: false,
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, String> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }
}
