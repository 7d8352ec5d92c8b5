//! Schema data model: raw source columns, normalized column descriptors and
//! the per-table schema context fed to rendering.

pub mod type_mapper;
pub mod normalize;

use serde::Serialize;

use crate::context::Snippets;

pub use normalize::{describe_column, normalize};
pub use type_mapper::{map_type, BaseType, TypeDescriptor};

/// One column as reported by a schema source, before type mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawColumn {
    pub name: String,
    /// Native database type (e.g. `varchar(255)`)
    pub native_type: Option<String>,
    /// Rust type named directly by the source, bypassing the type mapper
    pub type_hint: Option<String>,
    pub nullable: bool,
    pub is_primary: bool,
    pub auto_increment: bool,
    pub default_value: Option<String>,
    pub comment: String,
}

/// Everything a schema source reports about one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSchema {
    /// Table name as the source knows it
    pub table_name: String,
    /// Columns in source order
    pub columns: Vec<RawColumn>,
    /// Primary key resolved by the source, if any column qualified
    pub primary_key: Option<String>,
    /// Naming overrides carried by the source itself (schema files)
    pub overrides: NamingOverrides,
}

/// Explicit names that replace the derived ones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingOverrides {
    pub singular_name: Option<String>,
    pub struct_name: Option<String>,
}

impl NamingOverrides {
    /// Combine two override sets; values in `self` win over `lower`
    pub fn merged_over(&self, lower: &NamingOverrides) -> NamingOverrides {
        NamingOverrides {
            singular_name: self
                .singular_name
                .clone()
                .or_else(|| lower.singular_name.clone()),
            struct_name: self.struct_name.clone().or_else(|| lower.struct_name.clone()),
        }
    }
}

/// Normalized representation of one table column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub target_type: TypeDescriptor,
    pub is_nullable: bool,
    pub is_primary: bool,
    pub is_auto_increment: bool,
    /// Native type, kept for diagnostics and width extraction
    pub source_type: String,
    pub default_value: Option<String>,
    pub comment: String,
}

/// Render-ready metadata for one table/entity
///
/// Required values that are blank (empty strings, `None`, no columns) are
/// reported by [`crate::validate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaContext {
    pub table_name: String,
    pub singular_name: String,
    pub struct_name: String,
    pub primary_key: String,
    pub id_type: Option<TypeDescriptor>,
    pub columns: Vec<ColumnDescriptor>,
    /// Caller-supplied snippets; gaps are filled from the default context on validation
    pub snippets: Snippets,
}

impl SchemaContext {
    /// Column descriptor for the primary key, if present
    pub fn primary_column(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == self.primary_key)
    }
}
