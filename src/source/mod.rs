//! Schema sources: where raw column metadata comes from.
//!
//! Every source implements [`SchemaSource`]. The closed set of sources is
//! [`SourceKind`]; [`Source`] dispatches to the matching adapter so an
//! unknown source is a parse error, never a runtime lookup miss.

pub mod database;
pub mod file;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::GeneratorConfig;
use crate::schema::{NamingOverrides, RawColumn, RawSchema};

pub use database::{DatabaseBackend, DatabaseConfig, DatabaseSource};
pub use file::FileSource;

/// Error type for schema sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The source could not be reached
    Connection(String),
    /// The source was reached but introspection failed
    Query(String),
    /// The schema file does not exist
    NotFound(PathBuf),
    /// The schema document is malformed or lacks required fields
    Schema(String),
    /// The requested source kind is not available
    Unsupported(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Connection(msg) => write!(f, "Connection error: {}", msg),
            SourceError::Query(msg) => write!(f, "Query error: {}", msg),
            SourceError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            SourceError::Schema(msg) => write!(f, "Invalid schema: {}", msg),
            SourceError::Unsupported(msg) => write!(f, "Unsupported source: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Capability shared by every schema source
pub trait SchemaSource {
    /// Columns of `table`, in source order
    fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>, SourceError>;

    /// First column flagged primary, if any
    fn resolve_primary_key(&self, columns: &[RawColumn]) -> Option<String> {
        columns
            .iter()
            .find(|c| c.is_primary)
            .map(|c| c.name.clone())
    }

    /// Naming overrides stored alongside the schema (none by default)
    fn naming_overrides(&self, _table: &str) -> Result<NamingOverrides, SourceError> {
        Ok(NamingOverrides::default())
    }

    /// Columns, primary key and overrides for `table` in one call
    fn fetch(&self, table: &str) -> Result<RawSchema, SourceError> {
        let columns = self.list_columns(table)?;
        let primary_key = self.resolve_primary_key(&columns);
        let overrides = self.naming_overrides(table)?;

        Ok(RawSchema {
            table_name: table.to_string(),
            columns,
            primary_key,
            overrides,
        })
    }
}

/// Closed set of schema source variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SourceKind {
    Mysql,
    Postgres,
    Json,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Mysql => "mysql",
            SourceKind::Postgres => "postgres",
            SourceKind::Json => "json",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(SourceKind::Mysql),
            "postgres" | "postgresql" | "pg" => Ok(SourceKind::Postgres),
            "json" | "file" => Ok(SourceKind::Json),
            other => Err(SourceError::Unsupported(format!(
                "'{}' (supported: mysql, postgres, json)",
                other
            ))),
        }
    }
}

/// Schema source selected by [`SourceKind`]
#[derive(Debug, Clone)]
pub enum Source {
    Database(DatabaseSource),
    File(FileSource),
}

impl Source {
    /// Build the adapter for `kind` from the generator configuration
    ///
    /// Database settings missing from the configuration are read from the
    /// environment (see [`DatabaseConfig::from_env`]).
    pub fn from_config(kind: SourceKind, config: &GeneratorConfig) -> Source {
        match kind {
            SourceKind::Mysql | SourceKind::Postgres => {
                let backend = match kind {
                    SourceKind::Postgres => DatabaseBackend::Postgres,
                    _ => DatabaseBackend::Mysql,
                };
                let db_config = config
                    .database
                    .clone()
                    .unwrap_or_default()
                    .or_env(backend);
                Source::Database(DatabaseSource::new(backend, db_config))
            }
            SourceKind::Json => Source::File(FileSource::from_config(&config.file)),
        }
    }
}

impl SchemaSource for Source {
    fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>, SourceError> {
        match self {
            Source::Database(source) => source.list_columns(table),
            Source::File(source) => source.list_columns(table),
        }
    }

    fn naming_overrides(&self, table: &str) -> Result<NamingOverrides, SourceError> {
        match self {
            Source::Database(source) => source.naming_overrides(table),
            Source::File(source) => source.naming_overrides(table),
        }
    }

    fn fetch(&self, table: &str) -> Result<RawSchema, SourceError> {
        match self {
            Source::Database(source) => source.fetch(table),
            Source::File(source) => source.fetch(table),
        }
    }
}
