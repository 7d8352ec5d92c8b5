//! # Crudgen: CRUD scaffolding from table schemas
//!
//! Crudgen introspects a relational table (from a live MySQL/PostgreSQL database or a
//! JSON schema file) and renders Rust scaffolding for a typed web-service layer:
//!
//! - an **entity** struct mirroring the table row
//! - **create/update DTOs** with length validation derived from column widths
//! - **CRUD handlers** (`get`, `get_all`, `post`, `put`, `delete`)
//! - an optional **module aggregator** wiring the three together
//!
//! ## Pipeline
//!
//! ```text
//! SchemaSource ──► RawSchema ──► normalize ──► SchemaContext ──► validate
//!                                                                  │
//!            OutputSink ◄── Artifact ◄── TemplateSet::render ◄─────┘
//! ```
//!
//! ## Example: JSON schema file
//!
//! ```json
//! {
//!   "table_name": "patients",
//!   "columns": [
//!     { "name": "id", "db_type": "int(11) unsigned", "primary_key": true, "auto_increment": true },
//!     { "name": "full_name", "db_type": "varchar(120)" },
//!     { "name": "notes", "db_type": "text", "nullable": true }
//!   ]
//! }
//! ```
//!
//! ```ignore
//! use crudgen::{pipeline, Command, FileSource, MemorySink, TemplateSet};
//!
//! let source = FileSource::from_path("schemas/patients.json");
//! let templates = TemplateSet::builtin()?;
//! let request = pipeline::GenerationRequest::new("patients", Command::All);
//! let mut sink = MemorySink::default();
//! pipeline::run(&source, &templates, &request, &mut sink)?;
//! ```

pub mod error;
pub mod config;
pub mod schema;
pub mod source;
pub mod context;
pub mod codegen;
pub mod pipeline;

// Re-export key types
pub use error::Error;
pub use config::{ConfigError, GeneratorConfig};
pub use schema::{
    map_type, normalize, BaseType, ColumnDescriptor, NamingOverrides, RawColumn, RawSchema,
    SchemaContext, TypeDescriptor,
};
pub use source::{
    DatabaseBackend, DatabaseConfig, DatabaseSource, FileSource, SchemaSource, Source, SourceError,
    SourceKind,
};
pub use context::{
    validate, ContextError, DefaultContext, Snippets, ValidatedContext, DEFAULT_CONTEXT,
};
pub use codegen::{
    generate, Artifact, ArtifactKind, Command, DtoSet, FsSink, GenerateOptions, HandlerVerb,
    MemorySink, OutputSink, RenderError, TemplateSet,
};
