//! Template-facing view of a validated context.
//!
//! Templates see the schema context plus a few derived values (full and
//! unwrapped Rust types, declared string widths, insert/update column
//! subsets, merged snippets). The view borrows from the context and never
//! mutates it.

use serde::Serialize;

use crate::codegen::utils::{declared_width, rust_ident, single_line};
use crate::context::ValidatedContext;
use crate::schema::ColumnDescriptor;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ColumnView<'a> {
    pub name: &'a str,
    /// Field identifier, raw or suffixed when the name is a keyword
    pub ident: String,
    /// Whether `ident` spells something other than `name` and needs a rename attribute
    pub renamed: bool,
    /// Full target type, e.g. `Option<String>`
    pub rust_type: String,
    /// Target type without the `Option` wrapper
    pub base_type: &'a str,
    pub is_nullable: bool,
    pub is_primary: bool,
    pub is_auto_increment: bool,
    pub is_string: bool,
    pub max_length: Option<u32>,
    pub source_type: &'a str,
    pub default_value: Option<&'a str>,
    pub comment: String,
}

impl<'a> ColumnView<'a> {
    fn new(column: &'a ColumnDescriptor) -> Self {
        let is_string = column.target_type.base().is_string();
        let ident = rust_ident(&column.name);

        ColumnView {
            name: &column.name,
            renamed: ident.trim_start_matches("r#") != column.name,
            ident,
            rust_type: column.target_type.to_string(),
            base_type: column.target_type.base().as_rust(),
            is_nullable: column.is_nullable,
            is_primary: column.is_primary,
            is_auto_increment: column.is_auto_increment,
            is_string,
            max_length: if is_string {
                declared_width(&column.source_type)
            } else {
                None
            },
            source_type: &column.source_type,
            default_value: column.default_value.as_deref(),
            comment: single_line(&column.comment),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RenderView<'a> {
    pub table_name: &'a str,
    pub singular_name: &'a str,
    pub struct_name: &'a str,
    pub primary_key: &'a str,
    pub id_type: String,
    pub columns: Vec<ColumnView<'a>>,
    /// Columns supplied on insert (auto-increment columns are left to the database)
    pub insert_columns: Vec<ColumnView<'a>>,
    /// Columns that may change on update (everything but the primary key)
    pub update_columns: Vec<ColumnView<'a>>,
    pub connection_snippet: &'a str,
    pub error_mapping: &'a str,
    pub pagination_query: &'a str,
}

impl<'a> RenderView<'a> {
    pub fn new(context: &'a ValidatedContext) -> Self {
        let columns: Vec<ColumnView<'a>> = context.columns.iter().map(ColumnView::new).collect();

        let insert_columns = columns
            .iter()
            .filter(|c| !c.is_auto_increment)
            .cloned()
            .collect();

        let update_columns = columns
            .iter()
            .filter(|c| c.name != context.primary_key)
            .cloned()
            .collect();

        RenderView {
            table_name: &context.table_name,
            singular_name: &context.singular_name,
            struct_name: &context.struct_name,
            primary_key: &context.primary_key,
            id_type: context
                .id_type
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_default(),
            columns,
            insert_columns,
            update_columns,
            connection_snippet: context.connection_snippet(),
            error_mapping: context.error_mapping(),
            pagination_query: context.pagination_query(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::validate;
    use crate::schema::{normalize, NamingOverrides, RawColumn, RawSchema};

    fn context() -> ValidatedContext {
        let raw = RawSchema {
            table_name: "patients".to_string(),
            columns: vec![
                RawColumn {
                    name: "id".to_string(),
                    native_type: Some("int(11)".to_string()),
                    is_primary: true,
                    auto_increment: true,
                    ..Default::default()
                },
                RawColumn {
                    name: "full_name".to_string(),
                    native_type: Some("varchar(120)".to_string()),
                    comment: "Name as\nprinted".to_string(),
                    ..Default::default()
                },
                RawColumn {
                    name: "weight".to_string(),
                    native_type: Some("decimal(5,2)".to_string()),
                    nullable: true,
                    ..Default::default()
                },
            ],
            primary_key: Some("id".to_string()),
            overrides: NamingOverrides::default(),
        };
        validate(normalize("patients", &raw, &NamingOverrides::default())).unwrap()
    }

    #[test]
    fn test_column_subsets() {
        let ctx = context();
        let view = RenderView::new(&ctx);
        let names = |cols: &[ColumnView<'_>]| cols.iter().map(|c| c.name.to_string()).collect::<Vec<_>>();

        assert_eq!(names(&view.columns), ["id", "full_name", "weight"]);
        assert_eq!(names(&view.insert_columns), ["full_name", "weight"]);
        assert_eq!(names(&view.update_columns), ["full_name", "weight"]);
    }

    #[test]
    fn test_column_extension_fields() {
        let ctx = context();
        let view = RenderView::new(&ctx);

        let name = &view.columns[1];
        assert!(name.is_string);
        assert_eq!(name.max_length, Some(120));
        assert_eq!(name.comment, "Name as printed");

        let weight = &view.columns[2];
        assert_eq!(weight.rust_type, "Option<f64>");
        assert_eq!(weight.base_type, "f64");
        assert_eq!(weight.max_length, None);

        assert_eq!(view.id_type, "i32");
    }

    #[test]
    fn test_keyword_columns_get_safe_identifiers() {
        let column = |name: &str| ColumnDescriptor {
            name: name.to_string(),
            target_type: crate::schema::map_type("varchar(10)", false),
            is_nullable: false,
            is_primary: false,
            is_auto_increment: false,
            source_type: "varchar(10)".to_string(),
            default_value: None,
            comment: String::new(),
        };

        let plain = column("label");
        let keyword = column("type");
        let path_keyword = column("self");

        let view = ColumnView::new(&plain);
        assert_eq!((view.ident.as_str(), view.renamed), ("label", false));
        let view = ColumnView::new(&keyword);
        assert_eq!((view.ident.as_str(), view.renamed), ("r#type", false));
        let view = ColumnView::new(&path_keyword);
        assert_eq!((view.ident.as_str(), view.renamed), ("self_", true));
    }
}
