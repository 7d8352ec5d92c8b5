//! End-to-end generation: fetch, normalize, validate, render, write.
//!
//! Writing happens only after every requested template rendered, so a
//! failed run leaves the output root untouched.

use std::path::PathBuf;

use crate::codegen::{generate, Command, GenerateOptions, OutputSink, RenderError, TemplateSet};
use crate::config::TemplatesConfig;
use crate::context::{validate, Snippets, ValidatedContext};
use crate::error::Error;
use crate::schema::{normalize, NamingOverrides};
use crate::source::SchemaSource;

/// One table to generate for
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub table: String,
    pub command: Command,
    /// Caller naming overrides; win over the source's and the derived names
    pub overrides: NamingOverrides,
    /// Caller snippets; unset ones come from the default context
    pub snippets: Snippets,
    pub options: GenerateOptions,
}

impl GenerationRequest {
    pub fn new(table: impl Into<String>, command: Command) -> Self {
        Self {
            table: table.into(),
            command,
            overrides: NamingOverrides::default(),
            snippets: Snippets::default(),
            options: GenerateOptions::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: NamingOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_snippets(mut self, snippets: Snippets) -> Self {
        self.snippets = snippets;
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Template set described by the configuration
///
/// Without a directory the built-in set is used. A directory overlays the
/// built-in set, or replaces it when `standalone` is set.
pub fn load_templates(config: &TemplatesConfig) -> Result<TemplateSet, RenderError> {
    match &config.dir {
        None => TemplateSet::builtin(),
        Some(dir) if config.standalone => TemplateSet::from_dir(dir),
        Some(dir) => TemplateSet::builtin_with_overrides(dir),
    }
}

/// Fetch the table's schema and turn it into a validated context
pub fn build_context(
    source: &dyn SchemaSource,
    request: &GenerationRequest,
) -> Result<ValidatedContext, Error> {
    let raw = source.fetch(&request.table)?;

    let mut context = normalize(&raw.table_name, &raw, &request.overrides);
    context.snippets = request.snippets.clone();

    Ok(validate(context)?)
}

/// Generate the requested artifacts for one table and write them to `sink`
///
/// Returns the paths reported by the sink, in write order.
pub fn run(
    source: &dyn SchemaSource,
    templates: &TemplateSet,
    request: &GenerationRequest,
    sink: &mut dyn OutputSink,
) -> Result<Vec<PathBuf>, Error> {
    let context = build_context(source, request)?;
    let artifacts = generate(templates, &context, request.command, &request.options)?;

    tracing::info!(
        table = %context.table_name,
        command = %request.command,
        artifacts = artifacts.len(),
        "writing artifacts"
    );

    Ok(sink.write_all(&artifacts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::MemorySink;
    use crate::schema::RawColumn;
    use crate::source::SourceError;

    struct StaticSource(Vec<RawColumn>);

    impl SchemaSource for StaticSource {
        fn list_columns(&self, table: &str) -> Result<Vec<RawColumn>, SourceError> {
            if self.0.is_empty() {
                return Err(SourceError::Query(format!("table '{}' not found", table)));
            }
            Ok(self.0.clone())
        }
    }

    fn patients() -> StaticSource {
        StaticSource(vec![
            RawColumn {
                name: "id".to_string(),
                native_type: Some("int(11)".to_string()),
                is_primary: true,
                auto_increment: true,
                ..Default::default()
            },
            RawColumn {
                name: "full_name".to_string(),
                native_type: Some("varchar(80)".to_string()),
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_build_context_applies_request() {
        let request = GenerationRequest::new("patients", Command::All)
            .with_overrides(NamingOverrides {
                singular_name: None,
                struct_name: Some("Paciente".to_string()),
            })
            .with_snippets(Snippets {
                pagination_query: Some("LIMIT ?".to_string()),
                ..Default::default()
            });

        let context = build_context(&patients(), &request).unwrap();
        assert_eq!(context.struct_name, "Paciente");
        assert_eq!(context.singular_name, "patient");
        assert_eq!(context.pagination_query(), "LIMIT ?");
        assert_eq!(
            context.connection_snippet(),
            crate::DEFAULT_CONTEXT.connection_snippet
        );
    }

    #[test]
    fn test_run_writes_selected_artifacts() {
        let templates = TemplateSet::builtin().unwrap();
        let mut sink = MemorySink::new();

        let paths = run(
            &patients(),
            &templates,
            &GenerationRequest::new("patients", Command::Entity),
            &mut sink,
        )
        .unwrap();

        assert_eq!(paths, vec![PathBuf::from("entities/patients.rs")]);
        assert_eq!(sink.written.len(), 1);
    }

    #[test]
    fn test_source_failure_writes_nothing() {
        let templates = TemplateSet::builtin().unwrap();
        let mut sink = MemorySink::new();

        let err = run(
            &StaticSource(Vec::new()),
            &templates,
            &GenerationRequest::new("ghosts", Command::All),
            &mut sink,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Source(SourceError::Query(_))));
        assert!(sink.written.is_empty());
    }

    #[test]
    fn test_render_failure_writes_nothing() {
        let mut templates = TemplateSet::builtin().unwrap();
        templates.add("delete", "{{ missing_value }}").unwrap();
        let mut sink = MemorySink::new();

        let err = run(
            &patients(),
            &templates,
            &GenerationRequest::new("patients", Command::All),
            &mut sink,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Render(RenderError::Template { .. })));
        assert!(sink.written.is_empty());
    }

    #[test]
    fn test_load_templates_default_is_builtin() {
        let templates = load_templates(&TemplatesConfig::default()).unwrap();
        assert!(templates.contains("module"));
    }
}
