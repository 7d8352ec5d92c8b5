//! Naming and text helpers used during code generation.

use convert_case::{Case, Casing};
use regex::Regex;
use std::sync::OnceLock;

/// Convert a string to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    s.to_case(Case::Pascal)
}

/// Strip one trailing plural `s` (`usuarios` -> `usuario`)
pub fn singularize(s: &str) -> String {
    match s.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => s.to_string(),
    }
}

/// Declared width of a native type (`varchar(255)` -> 255)
pub fn declared_width(native_type: &str) -> Option<u32> {
    static WIDTH: OnceLock<Regex> = OnceLock::new();
    let re = WIDTH.get_or_init(|| Regex::new(r"\(\s*(\d+)\s*\)").expect("valid width regex"));

    re.captures(native_type)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Keywords that are valid as `r#` raw identifiers
const RAW_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers
const PATH_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

/// Rust field identifier for a column name (`type` -> `r#type`, `self` -> `self_`)
pub fn rust_ident(name: &str) -> String {
    if RAW_KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else if PATH_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Collapse all whitespace runs (including newlines) into single spaces
pub fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
