//! Native column type to Rust type mapping.
//!
//! Matching is substring based on the lower-cased native type and checked in a
//! fixed order: integers, floats, booleans, temporal types, character types.
//! Anything unrecognised maps to `String`. Because checks are substring based
//! the order is load-bearing (`interval` and `point` both hit the integer arm).

use serde::{Serialize, Serializer};
use std::fmt;

/// Unwrapped Rust type a column maps to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Bool,
    DateTime,
    String,
    /// Type named verbatim by a schema file hint
    Custom(String),
}

impl BaseType {
    /// Rust source spelling of this type
    pub fn as_rust(&self) -> &str {
        match self {
            BaseType::I32 => "i32",
            BaseType::I64 => "i64",
            BaseType::U32 => "u32",
            BaseType::U64 => "u64",
            BaseType::F32 => "f32",
            BaseType::F64 => "f64",
            BaseType::Bool => "bool",
            BaseType::DateTime => "chrono::NaiveDateTime",
            BaseType::String => "String",
            BaseType::Custom(name) => name,
        }
    }

    /// Parse a Rust type name; names outside the built-in set become `Custom`
    pub fn from_rust_name(name: &str) -> Self {
        match name.trim() {
            "i32" => BaseType::I32,
            "i64" => BaseType::I64,
            "u32" => BaseType::U32,
            "u64" => BaseType::U64,
            "f32" => BaseType::F32,
            "f64" => BaseType::F64,
            "bool" => BaseType::Bool,
            "chrono::NaiveDateTime" | "NaiveDateTime" => BaseType::DateTime,
            "String" => BaseType::String,
            other => BaseType::Custom(other.to_string()),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, BaseType::String)
    }

    /// Convert to the unsigned type of the same width (no-op for non-integers)
    fn to_unsigned(self) -> Self {
        match self {
            BaseType::I32 => BaseType::U32,
            BaseType::I64 => BaseType::U64,
            other => other,
        }
    }
}

/// Target type of a column, with an explicit optional/non-optional form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    base: BaseType,
    optional: bool,
}

impl TypeDescriptor {
    pub fn new(base: BaseType) -> Self {
        Self { base, optional: false }
    }

    /// Type used for the primary key when it cannot be resolved
    pub fn default_id() -> Self {
        Self::new(BaseType::I32)
    }

    /// Wrap in `Option<...>`; already optional types are returned unchanged
    pub fn wrap_optional(self) -> Self {
        Self { optional: true, ..self }
    }

    /// Parse a Rust type hint such as `i64` or `Option<String>`
    pub fn from_rust_hint(hint: &str) -> Self {
        let hint = hint.trim();
        match hint
            .strip_prefix("Option<")
            .and_then(|inner| inner.strip_suffix('>'))
        {
            Some(inner) => Self::new(BaseType::from_rust_name(inner)).wrap_optional(),
            None => Self::new(BaseType::from_rust_name(hint)),
        }
    }

    pub fn base(&self) -> &BaseType {
        &self.base
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "Option<{}>", self.base.as_rust())
        } else {
            f.write_str(self.base.as_rust())
        }
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Map a native column type to a Rust type descriptor
///
/// # Arguments
///
/// * `source_type` - Native type as reported by the source (e.g. `bigint(20) unsigned`)
/// * `nullable` - Whether the column accepts NULL; wraps the result in `Option`
///
/// # Example
///
/// ```
/// use crudgen::map_type;
///
/// assert_eq!(map_type("bigint unsigned", false).to_string(), "u64");
/// assert_eq!(map_type("varchar(255)", true).to_string(), "Option<String>");
/// ```
pub fn map_type(source_type: &str, nullable: bool) -> TypeDescriptor {
    let lowered = source_type.to_lowercase();

    let base = if lowered.contains("int") {
        // Width first, signedness second
        let sized = if lowered.contains("big") {
            BaseType::I64
        } else {
            BaseType::I32
        };
        if lowered.contains("unsigned") {
            sized.to_unsigned()
        } else {
            sized
        }
    } else if lowered.contains("float") {
        BaseType::F32
    } else if lowered.contains("double") || lowered.contains("decimal") {
        BaseType::F64
    } else if lowered.contains("bool") {
        BaseType::Bool
    } else if lowered.contains("date") || lowered.contains("time") {
        BaseType::DateTime
    } else {
        // char/varchar/text and anything unrecognised
        BaseType::String
    };

    let descriptor = TypeDescriptor::new(base);
    if nullable {
        descriptor.wrap_optional()
    } else {
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TYPES: &[&str] = &[
        "int(11)",
        "INT(11) UNSIGNED",
        "bigint(20)",
        "bigint unsigned",
        "tinyint(1)",
        "float",
        "double",
        "decimal(10,2)",
        "boolean",
        "date",
        "datetime",
        "timestamp without time zone",
        "varchar(255)",
        "text",
        "json",
        "",
    ];

    #[test]
    fn test_integer_family() {
        assert_eq!(map_type("int(11)", false).base(), &BaseType::I32);
        assert_eq!(map_type("bigint(20)", false).base(), &BaseType::I64);
        assert_eq!(map_type("int(11) unsigned", false).base(), &BaseType::U32);
        assert_eq!(map_type("smallint", false).base(), &BaseType::I32);
    }

    #[test]
    fn test_width_resolved_before_signedness() {
        assert_eq!(map_type("bigint unsigned", false).to_string(), "u64");
        assert_eq!(map_type("BIGINT(20) UNSIGNED", false).to_string(), "u64");
    }

    #[test]
    fn test_float_and_decimal() {
        assert_eq!(map_type("float", false).base(), &BaseType::F32);
        assert_eq!(map_type("double precision", false).base(), &BaseType::F64);
        assert_eq!(map_type("decimal(10,2)", false).base(), &BaseType::F64);
    }

    #[test]
    fn test_bool_and_temporal() {
        assert_eq!(map_type("boolean", false).base(), &BaseType::Bool);
        assert_eq!(map_type("datetime", false).to_string(), "chrono::NaiveDateTime");
        assert_eq!(map_type("time", false).base(), &BaseType::DateTime);
        // tinyint(1) is still an integer: int is checked first
        assert_eq!(map_type("tinyint(1)", false).base(), &BaseType::I32);
    }

    #[test]
    fn test_string_family_and_fallback() {
        assert_eq!(map_type("varchar(255)", false).to_string(), "String");
        assert_eq!(map_type("longtext", false).to_string(), "String");
        assert_eq!(map_type("json", false).to_string(), "String");
        assert_eq!(map_type("", false).to_string(), "String");
    }

    #[test]
    fn test_nullable_wraps_non_nullable_mapping() {
        for source_type in SAMPLE_TYPES {
            assert_eq!(
                map_type(source_type, true),
                map_type(source_type, false).wrap_optional(),
                "nullable mapping of {:?}",
                source_type
            );
        }
    }

    #[test]
    fn test_unsigned_nullable() {
        assert_eq!(map_type("int(11) unsigned", true).to_string(), "Option<u32>");
    }

    #[test]
    fn test_rust_hint_parsing() {
        assert_eq!(TypeDescriptor::from_rust_hint("i64").to_string(), "i64");
        let optional = TypeDescriptor::from_rust_hint("Option<String>");
        assert!(optional.is_optional());
        assert_eq!(optional.base(), &BaseType::String);
        assert_eq!(
            TypeDescriptor::from_rust_hint("uuid::Uuid").base(),
            &BaseType::Custom("uuid::Uuid".to_string())
        );
    }

    #[test]
    fn test_wrap_optional_is_idempotent() {
        let once = map_type("int", true);
        assert_eq!(once.clone().wrap_optional(), once);
    }
}
