//! Raw column metadata to schema context.

use crate::codegen::utils::{singularize, to_pascal_case};
use crate::context::Snippets;
use crate::schema::type_mapper::{map_type, TypeDescriptor};
use crate::schema::{ColumnDescriptor, NamingOverrides, RawColumn, RawSchema, SchemaContext};

/// Fallback primary key name when no column is flagged primary
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Map one raw column to a column descriptor
///
/// A source type hint is used verbatim; otherwise the native type goes
/// through [`map_type`]. Either way nullable columns end up `Option`-wrapped.
pub fn describe_column(raw: &RawColumn) -> ColumnDescriptor {
    let native = raw.native_type.clone().unwrap_or_default();

    let target_type = match raw.type_hint.as_deref() {
        Some(hint) => {
            let hinted = TypeDescriptor::from_rust_hint(hint);
            if raw.nullable {
                hinted.wrap_optional()
            } else {
                hinted
            }
        }
        None => map_type(&native, raw.nullable),
    };

    ColumnDescriptor {
        name: raw.name.clone(),
        is_nullable: target_type.is_optional(),
        target_type,
        is_primary: raw.is_primary,
        is_auto_increment: raw.auto_increment,
        source_type: native,
        default_value: raw.default_value.clone(),
        comment: raw.comment.clone(),
    }
}

/// Build the schema context for a table
///
/// # Arguments
///
/// * `table_name` - Table identifier used for derived names
/// * `raw` - Source output (columns in source order and resolved primary key)
/// * `overrides` - Caller overrides; these win over overrides carried by `raw`,
///   which in turn win over derived names
pub fn normalize(table_name: &str, raw: &RawSchema, overrides: &NamingOverrides) -> SchemaContext {
    let columns: Vec<ColumnDescriptor> = raw.columns.iter().map(describe_column).collect();
    let naming = overrides.merged_over(&raw.overrides);

    let primary_key = raw
        .primary_key
        .clone()
        .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());

    let id_type = columns
        .iter()
        .find(|c| c.name == primary_key)
        .map(|c| c.target_type.clone())
        .unwrap_or_else(TypeDescriptor::default_id);

    tracing::debug!(
        table = table_name,
        columns = columns.len(),
        primary_key = %primary_key,
        id_type = %id_type,
        "normalized schema"
    );

    SchemaContext {
        table_name: table_name.to_string(),
        singular_name: naming
            .singular_name
            .unwrap_or_else(|| singularize(table_name)),
        struct_name: naming
            .struct_name
            .unwrap_or_else(|| to_pascal_case(table_name)),
        primary_key,
        id_type: Some(id_type),
        columns,
        snippets: Snippets::default(),
    }
}
