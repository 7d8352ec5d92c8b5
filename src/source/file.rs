//! JSON schema file source.
//!
//! A schema file describes one table:
//!
//! ```json
//! {
//!   "table_name": "usuarios",
//!   "struct_name": "Usuario",
//!   "columns": [
//!     { "name": "id", "rust_type": "i32", "primary_key": true, "auto_increment": true },
//!     { "name": "email", "db_type": "varchar(100)", "nullable": true, "comment": "Contact email" }
//!   ]
//! }
//! ```
//!
//! `table_name` and `columns` are required; each column needs a `name`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::FileConfig;
use crate::schema::{NamingOverrides, RawColumn, RawSchema};
use crate::source::{SchemaSource, SourceError};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SchemaDocument {
    table_name: Option<String>,
    singular_name: Option<String>,
    struct_name: Option<String>,
    columns: Option<Vec<ColumnDocument>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ColumnDocument {
    name: Option<String>,
    rust_type: Option<String>,
    db_type: Option<String>,
    nullable: bool,
    primary_key: bool,
    auto_increment: bool,
    default: Option<serde_json::Value>,
    comment: Option<String>,
}

impl ColumnDocument {
    fn into_raw(self, index: usize) -> Result<RawColumn, SourceError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| SourceError::Schema(format!("column #{} has no name", index + 1)))?;

        Ok(RawColumn {
            name,
            native_type: self.db_type.filter(|t| !t.is_empty()),
            type_hint: self.rust_type.filter(|t| !t.is_empty()),
            nullable: self.nullable,
            is_primary: self.primary_key,
            auto_increment: self.auto_increment,
            default_value: self.default.and_then(literal_to_string),
            comment: self.comment.unwrap_or_default(),
        })
    }
}

/// Render a JSON default literal; strings lose their quotes, `null` is absent
fn literal_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Schema source reading JSON schema files
#[derive(Debug, Clone)]
pub struct FileSource {
    path: Option<PathBuf>,
    schema_dir: PathBuf,
}

impl FileSource {
    /// Read every table from one explicit file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            schema_dir: PathBuf::from(crate::config::DEFAULT_SCHEMA_DIR),
        }
    }

    /// Read `<dir>/<table>.json`
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: None,
            schema_dir: dir.into(),
        }
    }

    pub fn from_config(config: &FileConfig) -> Self {
        Self {
            path: config.path.clone(),
            schema_dir: config.schema_dir.clone(),
        }
    }

    /// File the schema of `table` is read from
    pub fn schema_path(&self, table: &str) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => self.schema_dir.join(format!("{}.json", table)),
        }
    }

    /// Load and check the schema document for `table`
    pub fn load(&self, table: &str) -> Result<RawSchema, SourceError> {
        let path = self.schema_path(table);
        let document = read_document(&path)?;

        let mut missing = Vec::new();
        if document.table_name.as_deref().map_or(true, |t| t.trim().is_empty()) {
            missing.push("table_name");
        }
        if document.columns.is_none() {
            missing.push("columns");
        }
        if !missing.is_empty() {
            return Err(SourceError::Schema(format!(
                "{} is missing required fields: {}",
                path.display(),
                missing.join(", ")
            )));
        }

        let table_name = document.table_name.unwrap_or_default();
        if table_name != table {
            tracing::warn!(
                requested = table,
                declared = %table_name,
                path = %path.display(),
                "schema file declares a different table name; using the declared one"
            );
        }

        let columns = document
            .columns
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, column)| column.into_raw(index))
            .collect::<Result<Vec<_>, _>>()?;

        let primary_key = self.resolve_primary_key(&columns);

        tracing::debug!(path = %path.display(), columns = columns.len(), "loaded schema file");

        Ok(RawSchema {
            table_name,
            columns,
            primary_key,
            overrides: NamingOverrides {
                singular_name: document.singular_name,
                struct_name: document.struct_name,
            },
        })
    }
}

fn read_document(path: &Path) -> Result<SchemaDocument, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| SourceError::Schema(format!("failed to read {}: {}", path.display(), e)))?;

    serde_json::from_str(&content)
        .map_err(|e| SourceError::Schema(format!("failed to parse {}: {}", path.display(), e)))
}

impl SchemaSource for FileSource {
    fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>, SourceError> {
        Ok(self.load(table)?.columns)
    }

    fn naming_overrides(&self, table: &str) -> Result<NamingOverrides, SourceError> {
        Ok(self.load(table)?.overrides)
    }

    fn fetch(&self, table: &str) -> Result<RawSchema, SourceError> {
        self.load(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn schema_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let source = FileSource::from_dir("/nonexistent/schemas");
        assert_eq!(
            source.fetch("usuarios").unwrap_err(),
            SourceError::NotFound(PathBuf::from("/nonexistent/schemas/usuarios.json"))
        );
    }

    #[test]
    fn test_missing_required_fields() {
        let file = schema_file(r#"{ "struct_name": "Thing" }"#);
        let err = FileSource::from_path(file.path()).fetch("things").unwrap_err();
        match err {
            SourceError::Schema(msg) => {
                assert!(msg.contains("table_name"));
                assert!(msg.contains("columns"));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json() {
        let file = schema_file("{ not json");
        assert!(matches!(
            FileSource::from_path(file.path()).fetch("things"),
            Err(SourceError::Schema(_))
        ));
    }

    #[test]
    fn test_column_without_name() {
        let file = schema_file(r#"{ "table_name": "things", "columns": [{ "name": "id" }, { "db_type": "text" }] }"#);
        let err = FileSource::from_path(file.path()).fetch("things").unwrap_err();
        assert_eq!(err, SourceError::Schema("column #2 has no name".to_string()));
    }

    #[test]
    fn test_columns_and_overrides() {
        let file = schema_file(
            r#"{
                "table_name": "things",
                "singular_name": "thing",
                "columns": [
                    { "name": "code", "rust_type": "String", "primary_key": true },
                    { "name": "qty", "db_type": "int(11)", "default": 0 },
                    { "name": "label", "default": "none", "nullable": true, "comment": "Label" },
                    { "name": "gone", "default": null }
                ]
            }"#,
        );
        let raw = FileSource::from_path(file.path()).fetch("things").unwrap();

        assert_eq!(raw.table_name, "things");
        assert_eq!(raw.primary_key.as_deref(), Some("code"));
        assert_eq!(raw.overrides.singular_name.as_deref(), Some("thing"));
        assert_eq!(raw.overrides.struct_name, None);

        assert_eq!(raw.columns[0].type_hint.as_deref(), Some("String"));
        assert_eq!(raw.columns[1].native_type.as_deref(), Some("int(11)"));
        assert_eq!(raw.columns[1].default_value.as_deref(), Some("0"));
        assert_eq!(raw.columns[2].default_value.as_deref(), Some("none"));
        assert!(raw.columns[2].nullable);
        assert_eq!(raw.columns[2].comment, "Label");
        assert_eq!(raw.columns[3].default_value, None);
    }

    #[test]
    fn test_declared_table_name_is_used() {
        let file = schema_file(r#"{ "table_name": "real_name", "columns": [] }"#);
        let raw = FileSource::from_path(file.path()).fetch("alias").unwrap();
        assert_eq!(raw.table_name, "real_name");
        assert!(raw.columns.is_empty());
    }
}
