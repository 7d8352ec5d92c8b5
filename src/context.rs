//! Context validation and default-context merging.
//!
//! Validation checks that every required value of a [`SchemaContext`] is
//! present, then fills caller snippets that were left unset from the
//! process-wide [`DEFAULT_CONTEXT`]. Caller values always win.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

use crate::schema::SchemaContext;

/// Fallback snippets spliced into handler templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultContext {
    pub connection_snippet: &'static str,
    pub error_mapping: &'static str,
    pub pagination_query: &'static str,
}

pub const DEFAULT_CONTEXT: DefaultContext = DefaultContext {
    connection_snippet: "let mut conn = crate::db::get_conn().await?;",
    error_mapping: ".map_err(|e| crate::error::AppError::Database(e.to_string()))?",
    pagination_query: "LIMIT ? OFFSET ?",
};

/// Caller-supplied snippets; `None` means "use the default"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Snippets {
    pub connection_snippet: Option<String>,
    pub error_mapping: Option<String>,
    pub pagination_query: Option<String>,
}

impl Snippets {
    /// Fill unset snippets from `defaults`; set ones are kept as-is
    pub fn merged_over(&self, defaults: &DefaultContext) -> Snippets {
        fn pick(value: &Option<String>, fallback: &str) -> Option<String> {
            Some(value.clone().unwrap_or_else(|| fallback.to_string()))
        }

        Snippets {
            connection_snippet: pick(&self.connection_snippet, defaults.connection_snippet),
            error_mapping: pick(&self.error_mapping, defaults.error_mapping),
            pagination_query: pick(&self.pagination_query, defaults.pagination_query),
        }
    }
}

/// Error type for context validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// Every required field that was absent, in declaration order
    MissingFields(Vec<&'static str>),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::MissingFields(fields) => {
                write!(f, "missing required fields: {}", fields.join(", "))
            }
        }
    }
}

impl std::error::Error for ContextError {}

/// A schema context that passed validation and carries merged snippets
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedContext(SchemaContext);

impl ValidatedContext {
    pub fn into_inner(self) -> SchemaContext {
        self.0
    }

    /// Shallow copy with `struct_name` suffixed (used for DTO variants)
    pub fn with_struct_suffix(&self, suffix: &str) -> ValidatedContext {
        let mut context = self.0.clone();
        context.struct_name = format!("{}{}", self.0.struct_name, suffix);
        ValidatedContext(context)
    }

    pub fn connection_snippet(&self) -> &str {
        self.0
            .snippets
            .connection_snippet
            .as_deref()
            .unwrap_or(DEFAULT_CONTEXT.connection_snippet)
    }

    pub fn error_mapping(&self) -> &str {
        self.0
            .snippets
            .error_mapping
            .as_deref()
            .unwrap_or(DEFAULT_CONTEXT.error_mapping)
    }

    pub fn pagination_query(&self) -> &str {
        self.0
            .snippets
            .pagination_query
            .as_deref()
            .unwrap_or(DEFAULT_CONTEXT.pagination_query)
    }
}

impl Deref for ValidatedContext {
    type Target = SchemaContext;

    fn deref(&self) -> &SchemaContext {
        &self.0
    }
}

/// Validate against [`DEFAULT_CONTEXT`]
pub fn validate(context: SchemaContext) -> Result<ValidatedContext, ContextError> {
    validate_with(context, &DEFAULT_CONTEXT)
}

/// Validate a context and merge `defaults` underneath its snippets
///
/// Fails with [`ContextError::MissingFields`] naming every absent field.
pub fn validate_with(
    context: SchemaContext,
    defaults: &DefaultContext,
) -> Result<ValidatedContext, ContextError> {
    let checks: [(&'static str, bool); 6] = [
        ("table_name", is_blank(&context.table_name)),
        ("singular_name", is_blank(&context.singular_name)),
        ("struct_name", is_blank(&context.struct_name)),
        ("primary_key", is_blank(&context.primary_key)),
        ("id_type", context.id_type.is_none()),
        ("columns", context.columns.is_empty()),
    ];

    let missing: Vec<&'static str> = checks
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(ContextError::MissingFields(missing));
    }

    let snippets = context.snippets.merged_over(defaults);
    Ok(ValidatedContext(SchemaContext { snippets, ..context }))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
