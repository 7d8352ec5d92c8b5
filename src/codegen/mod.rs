//! CRUD code generation from a validated schema context.
//!
//! [`generate`] renders the artifacts a [`Command`] asks for and returns them
//! without touching the filesystem; writing is left to an [`OutputSink`].

pub mod fs_utils;
pub mod sink;
pub mod templates;
pub mod utils;
pub(crate) mod view;

use std::fmt;
use std::path::PathBuf;

pub use sink::{FsSink, MemorySink, OutputSink};
pub use templates::{RenderError, TemplateSet, REQUIRED_TEMPLATES};

use crate::context::ValidatedContext;

/// What to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Command {
    All,
    Entity,
    Dtos,
    Handlers,
}

impl Command {
    fn wants(self, kind: ArtifactKind) -> bool {
        match (self, kind) {
            (Command::All, _) => true,
            (Command::Entity, ArtifactKind::Entity) => true,
            (Command::Dtos, ArtifactKind::Dtos) => true,
            (Command::Handlers, ArtifactKind::Handlers) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::All => "all",
            Command::Entity => "entity",
            Command::Dtos => "dtos",
            Command::Handlers => "handlers",
        };
        f.write_str(name)
    }
}

/// Kind of generated file; decides where it is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Entity,
    Dtos,
    Handlers,
    Module,
}

impl ArtifactKind {
    /// Subdirectory under the output root (empty for the root itself)
    pub fn dir(&self) -> &'static str {
        match self {
            ArtifactKind::Entity => "entities",
            ArtifactKind::Dtos => "dtos",
            ArtifactKind::Handlers => "handlers",
            ArtifactKind::Module => "",
        }
    }

    /// File name for a table's artifact of this kind
    pub fn file_name(&self, table: &str) -> String {
        match self {
            ArtifactKind::Entity => format!("{}.rs", table),
            ArtifactKind::Dtos => format!("{}_dtos.rs", table),
            ArtifactKind::Handlers => format!("{}_handlers.rs", table),
            ArtifactKind::Module => format!("{}_mod.rs", table),
        }
    }
}

/// One rendered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Table the artifact was generated for
    pub table: String,
    pub contents: String,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, table: impl Into<String>, contents: String) -> Self {
        Self {
            kind,
            table: table.into(),
            contents,
        }
    }

    /// Path relative to the output root
    pub fn relative_path(&self) -> PathBuf {
        let file_name = self.kind.file_name(&self.table);
        match self.kind.dir() {
            "" => PathBuf::from(file_name),
            dir => PathBuf::from(dir).join(file_name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Also emit the module aggregator when generating everything
    pub module: bool,
}

/// The five CRUD handler verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandlerVerb {
    Get,
    GetAll,
    Post,
    Put,
    Delete,
}

impl HandlerVerb {
    pub const ALL: [HandlerVerb; 5] = [
        HandlerVerb::Get,
        HandlerVerb::GetAll,
        HandlerVerb::Post,
        HandlerVerb::Put,
        HandlerVerb::Delete,
    ];

    pub fn template_id(&self) -> &'static str {
        match self {
            HandlerVerb::Get => "get",
            HandlerVerb::GetAll => "get_all",
            HandlerVerb::Post => "post",
            HandlerVerb::Put => "put",
            HandlerVerb::Delete => "delete",
        }
    }

    /// Section label used in the combined handlers file
    pub fn label(&self) -> &'static str {
        match self {
            HandlerVerb::Get => "GET",
            HandlerVerb::GetAll => "GET_ALL",
            HandlerVerb::Post => "POST",
            HandlerVerb::Put => "PUT",
            HandlerVerb::Delete => "DELETE",
        }
    }
}

/// Rendered create/update DTO pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtoSet {
    pub create: String,
    pub update: String,
}

impl DtoSet {
    /// Both DTOs in one file
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.create.trim_end(), self.update.trim_end())
    }
}

/// Render every artifact `command` asks for
///
/// Nothing is returned unless all requested templates rendered, so a caller
/// that writes the result never leaves a partial set behind.
///
/// # Arguments
///
/// * `templates` - Template set to render with
/// * `context` - Validated schema context
/// * `command` - Which artifacts to produce
/// * `options` - Extra outputs (module aggregator)
pub fn generate(
    templates: &TemplateSet,
    context: &ValidatedContext,
    command: Command,
    options: &GenerateOptions,
) -> Result<Vec<Artifact>, RenderError> {
    let table = context.table_name.as_str();
    let mut artifacts = Vec::new();

    if command.wants(ArtifactKind::Entity) {
        let entity = templates.render_entity(context)?;
        artifacts.push(Artifact::new(ArtifactKind::Entity, table, entity));
    }

    if command.wants(ArtifactKind::Dtos) {
        let dtos = templates.render_dtos(context)?;
        artifacts.push(Artifact::new(ArtifactKind::Dtos, table, dtos.combined()));
    }

    if command.wants(ArtifactKind::Handlers) {
        let handlers = templates.render_handlers(context)?;
        let combined = handlers
            .iter()
            .map(|(verb, code)| format!("// {}\n{}", verb.label(), code.trim_end()))
            .collect::<Vec<_>>()
            .join("\n\n");
        artifacts.push(Artifact::new(ArtifactKind::Handlers, table, combined));
    }

    if command == Command::All && options.module {
        let module = templates.render_module(context)?;
        artifacts.push(Artifact::new(ArtifactKind::Module, table, module));
    }

    tracing::debug!(table, %command, artifacts = artifacts.len(), "rendered artifacts");

    Ok(artifacts)
}
