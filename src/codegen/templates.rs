//! Template registry and rendering.
//!
//! Templates are minijinja sources keyed by id. The built-in set is embedded
//! in the binary; a directory of `<id>.rs.j2` files can overlay it or replace
//! it entirely. Rendering is pure: a validated context in, text out.

use indexmap::IndexMap;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codegen::view::RenderView;
use crate::codegen::{DtoSet, HandlerVerb};
use crate::context::ValidatedContext;

/// File extension of template files in an override directory
pub const TEMPLATE_EXTENSION: &str = ".rs.j2";

/// Template ids every complete set must provide
pub const REQUIRED_TEMPLATES: [&str; 9] = [
    "entity",
    "create_dto",
    "update_dto",
    "get",
    "get_all",
    "post",
    "put",
    "delete",
    "module",
];

const BUILTIN_TEMPLATES: [(&str, &str); 9] = [
    ("entity", include_str!("../../templates/entity.rs.j2")),
    ("create_dto", include_str!("../../templates/create_dto.rs.j2")),
    ("update_dto", include_str!("../../templates/update_dto.rs.j2")),
    ("get", include_str!("../../templates/get.rs.j2")),
    ("get_all", include_str!("../../templates/get_all.rs.j2")),
    ("post", include_str!("../../templates/post.rs.j2")),
    ("put", include_str!("../../templates/put.rs.j2")),
    ("delete", include_str!("../../templates/delete.rs.j2")),
    ("module", include_str!("../../templates/module.rs.j2")),
];

/// Error type for template loading and rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Lookup of a template id failed
    TemplateNotFound { name: String, available: Vec<String> },
    /// A standalone template directory lacks required templates
    MissingTemplates { dir: PathBuf, missing: Vec<String> },
    /// The template directory could not be read
    TemplateDir { dir: PathBuf, message: String },
    /// Template syntax or evaluation failure
    Template { name: String, message: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TemplateNotFound { name, available } => write!(
                f,
                "template '{}' not found; available templates: {}",
                name,
                available.join(", ")
            ),
            RenderError::MissingTemplates { dir, missing } => write!(
                f,
                "missing templates in {}: {}",
                dir.display(),
                missing
                    .iter()
                    .map(|id| format!("{}{}", id, TEMPLATE_EXTENSION))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            RenderError::TemplateDir { dir, message } => {
                write!(f, "failed to read template directory {}: {}", dir.display(), message)
            }
            RenderError::Template { name, message } => {
                write!(f, "template '{}' failed: {}", name, message)
            }
        }
    }
}

impl std::error::Error for RenderError {}

impl RenderError {
    fn template(name: &str, err: minijinja::Error) -> Self {
        RenderError::Template {
            name: name.to_string(),
            message: err.to_string(),
        }
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env
}

/// Set of named templates
pub struct TemplateSet {
    env: Environment<'static>,
    names: BTreeSet<String>,
}

impl fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSet")
            .field("names", &self.names)
            .finish()
    }
}

impl TemplateSet {
    /// A set with no templates
    pub fn empty() -> Self {
        Self {
            env: environment(),
            names: BTreeSet::new(),
        }
    }

    /// The templates embedded in the crate
    pub fn builtin() -> Result<Self, RenderError> {
        let mut set = Self::empty();
        for (name, source) in BUILTIN_TEMPLATES {
            set.env
                .add_template(name, source)
                .map_err(|e| RenderError::template(name, e))?;
            set.names.insert(name.to_string());
        }
        Ok(set)
    }

    /// Templates from `dir` only; fails unless every required id is present
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, RenderError> {
        let mut set = Self::empty();
        set.load_dir(dir.as_ref())?;
        set.verify_required(dir.as_ref())?;
        Ok(set)
    }

    /// Built-in templates with same-named ones replaced from `dir`
    pub fn builtin_with_overrides<P: AsRef<Path>>(dir: P) -> Result<Self, RenderError> {
        let mut set = Self::builtin()?;
        set.load_dir(dir.as_ref())?;
        Ok(set)
    }

    /// Add or replace a template
    pub fn add(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), RenderError> {
        let name = name.into();
        self.env
            .add_template_owned(name.clone(), source.into())
            .map_err(|e| RenderError::template(&name, e))?;
        self.names.insert(name);
        Ok(())
    }

    fn load_dir(&mut self, dir: &Path) -> Result<(), RenderError> {
        let dir_error = |message: String| RenderError::TemplateDir {
            dir: dir.to_path_buf(),
            message,
        };

        let entries = fs::read_dir(dir).map_err(|e| dir_error(e.to_string()))?;

        for entry in entries {
            let path = entry.map_err(|e| dir_error(e.to_string()))?.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(TEMPLATE_EXTENSION))
            else {
                continue;
            };

            let source = fs::read_to_string(&path)
                .map_err(|e| dir_error(format!("{}: {}", path.display(), e)))?;
            tracing::debug!(template = name, path = %path.display(), "loaded template");
            self.add(name.to_string(), source)?;
        }

        Ok(())
    }

    /// Check that every id in [`REQUIRED_TEMPLATES`] is present
    pub fn verify_required(&self, dir: &Path) -> Result<(), RenderError> {
        let missing: Vec<String> = REQUIRED_TEMPLATES
            .iter()
            .filter(|id| !self.names.contains(**id))
            .map(|id| id.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RenderError::MissingTemplates {
                dir: dir.to_path_buf(),
                missing,
            })
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Template ids, sorted
    pub fn available(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    /// Render one template against a validated context
    pub fn render(&self, name: &str, context: &ValidatedContext) -> Result<String, RenderError> {
        if !self.contains(name) {
            return Err(RenderError::TemplateNotFound {
                name: name.to_string(),
                available: self.available(),
            });
        }

        let template = self
            .env
            .get_template(name)
            .map_err(|e| RenderError::template(name, e))?;

        template
            .render(RenderView::new(context))
            .map_err(|e| RenderError::template(name, e))
    }

    /// Render several templates; any failure fails the whole batch
    pub fn render_batch(
        &self,
        names: &[&str],
        context: &ValidatedContext,
    ) -> Result<IndexMap<String, String>, RenderError> {
        names
            .iter()
            .map(|name| Ok((name.to_string(), self.render(name, context)?)))
            .collect()
    }

    pub fn render_entity(&self, context: &ValidatedContext) -> Result<String, RenderError> {
        self.render("entity", context)
    }

    /// Create and update DTOs, rendered against `<Struct>Create` / `<Struct>Update`
    pub fn render_dtos(&self, context: &ValidatedContext) -> Result<DtoSet, RenderError> {
        Ok(DtoSet {
            create: self.render("create_dto", &context.with_struct_suffix("Create"))?,
            update: self.render("update_dto", &context.with_struct_suffix("Update"))?,
        })
    }

    /// All five verb handlers against the unmodified context
    pub fn render_handlers(
        &self,
        context: &ValidatedContext,
    ) -> Result<IndexMap<HandlerVerb, String>, RenderError> {
        HandlerVerb::ALL
            .iter()
            .map(|verb| Ok((*verb, self.render(verb.template_id(), context)?)))
            .collect()
    }

    pub fn render_module(&self, context: &ValidatedContext) -> Result<String, RenderError> {
        self.render("module", context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::validate;
    use crate::schema::{normalize, NamingOverrides, RawColumn, RawSchema};

    fn patient_context() -> ValidatedContext {
        let raw = RawSchema {
            table_name: "patients".to_string(),
            columns: vec![
                RawColumn {
                    name: "id".to_string(),
                    native_type: Some("int(11) unsigned".to_string()),
                    is_primary: true,
                    auto_increment: true,
                    ..Default::default()
                },
                RawColumn {
                    name: "full_name".to_string(),
                    native_type: Some("varchar(120)".to_string()),
                    comment: "Display name".to_string(),
                    ..Default::default()
                },
                RawColumn {
                    name: "born_at".to_string(),
                    native_type: Some("date".to_string()),
                    nullable: true,
                    ..Default::default()
                },
            ],
            primary_key: Some("id".to_string()),
            overrides: NamingOverrides::default(),
        };
        let overrides = NamingOverrides {
            struct_name: Some("Patient".to_string()),
            singular_name: None,
        };
        validate(normalize("patients", &raw, &overrides)).unwrap()
    }

    #[test]
    fn test_builtin_has_required_templates() {
        let set = TemplateSet::builtin().unwrap();
        for id in REQUIRED_TEMPLATES {
            assert!(set.contains(id), "missing builtin template {}", id);
        }
        assert!(set.verify_required(Path::new("builtin")).is_ok());
    }

    #[test]
    fn test_unknown_template_lists_available() {
        let set = TemplateSet::builtin().unwrap();
        let err = set.render("patch", &patient_context()).unwrap_err();
        match &err {
            RenderError::TemplateNotFound { name, available } => {
                assert_eq!(name, "patch");
                assert_eq!(available.len(), REQUIRED_TEMPLATES.len());
                for id in REQUIRED_TEMPLATES {
                    assert!(available.iter().any(|a| a == id));
                }
            }
            other => panic!("unexpected error {:?}", other),
        }
        let message = err.to_string();
        for id in REQUIRED_TEMPLATES {
            assert!(message.contains(id), "{} not listed in {}", id, message);
        }
    }

    #[test]
    fn test_entity_render() {
        let set = TemplateSet::builtin().unwrap();
        let entity = set.render_entity(&patient_context()).unwrap();
        assert!(entity.contains("pub struct Patient {"));
        assert!(entity.contains("pub id: u32,"));
        assert!(entity.contains("pub full_name: String,"));
        assert!(entity.contains("pub born_at: Option<chrono::NaiveDateTime>,"));
        assert!(entity.contains("/// Display name"));
    }

    #[test]
    fn test_dto_struct_names() {
        let set = TemplateSet::builtin().unwrap();
        let ctx = patient_context();
        let dtos = set.render_dtos(&ctx).unwrap();

        assert!(dtos.create.contains("pub struct PatientCreate {"));
        assert!(dtos.update.contains("pub struct PatientUpdate {"));
        assert!(dtos.create.contains("max = 120"));
        // auto-increment key is not part of the create payload
        assert!(!dtos.create.contains("pub id:"));
        assert_eq!(ctx.struct_name, "Patient");
    }

    #[test]
    fn test_handlers_keyed_by_verb() {
        let set = TemplateSet::builtin().unwrap();
        let handlers = set.render_handlers(&patient_context()).unwrap();

        let verbs: Vec<_> = handlers.keys().copied().collect();
        assert_eq!(verbs, HandlerVerb::ALL.to_vec());
        assert!(handlers[&HandlerVerb::Get].contains("fn get_patient("));
        assert!(handlers[&HandlerVerb::GetAll].contains("fn get_all_patients("));
        assert!(handlers[&HandlerVerb::Post].contains("fn create_patient("));
        assert!(handlers[&HandlerVerb::Put].contains("fn update_patient("));
        assert!(handlers[&HandlerVerb::Delete].contains("fn delete_patient("));
        assert!(handlers[&HandlerVerb::GetAll].contains("LIMIT ? OFFSET ?"));
    }

    #[test]
    fn test_keyword_column_renders_as_raw_identifier() {
        let raw = RawSchema {
            table_name: "devices".to_string(),
            columns: vec![
                RawColumn {
                    name: "id".to_string(),
                    native_type: Some("int(11)".to_string()),
                    is_primary: true,
                    auto_increment: true,
                    ..Default::default()
                },
                RawColumn {
                    name: "type".to_string(),
                    native_type: Some("varchar(20)".to_string()),
                    ..Default::default()
                },
            ],
            primary_key: Some("id".to_string()),
            overrides: NamingOverrides::default(),
        };
        let ctx = validate(normalize("devices", &raw, &NamingOverrides::default())).unwrap();
        let set = TemplateSet::builtin().unwrap();

        let entity = set.render_entity(&ctx).unwrap();
        assert!(entity.contains("pub r#type: String,"));

        let handlers = set.render_handlers(&ctx).unwrap();
        let post = &handlers[&HandlerVerb::Post];
        assert!(post.contains("INSERT INTO devices (type) VALUES (?)"));
        assert!(post.contains(".bind(&payload.r#type)"));
        assert!(handlers[&HandlerVerb::Put].contains("type = COALESCE(?, type)"));
    }

    #[test]
    fn test_render_batch_fails_as_a_whole() {
        let set = TemplateSet::builtin().unwrap();
        let ctx = patient_context();

        let ok = set.render_batch(&["entity", "get"], &ctx).unwrap();
        assert_eq!(ok.keys().collect::<Vec<_>>(), ["entity", "get"]);

        assert!(matches!(
            set.render_batch(&["entity", "missing"], &ctx),
            Err(RenderError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn test_strict_undefined_is_an_error() {
        let mut set = TemplateSet::empty();
        set.add("broken", "{{ no_such_field }}").unwrap();
        assert!(matches!(
            set.render("broken", &patient_context()),
            Err(RenderError::Template { .. })
        ));
    }

    #[test]
    fn test_syntax_error_on_add() {
        let mut set = TemplateSet::empty();
        assert!(matches!(
            set.add("bad", "{% for x in %}"),
            Err(RenderError::Template { .. })
        ));
    }

    #[test]
    fn test_standalone_dir_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("entity.rs.j2"), "struct {{ struct_name }};").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        match TemplateSet::from_dir(dir.path()).unwrap_err() {
            RenderError::MissingTemplates { missing, .. } => {
                assert_eq!(missing.len(), REQUIRED_TEMPLATES.len() - 1);
                assert!(!missing.contains(&"entity".to_string()));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_override_replaces_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("entity.rs.j2"), "struct {{ struct_name }};").unwrap();
        fs::write(dir.path().join("extra.rs.j2"), "// {{ table_name }}").unwrap();

        let set = TemplateSet::builtin_with_overrides(dir.path()).unwrap();
        let ctx = patient_context();
        assert_eq!(set.render("entity", &ctx).unwrap(), "struct Patient;");
        assert_eq!(set.render("extra", &ctx).unwrap(), "// patients");
        assert!(set.contains("get"));
    }

    #[test]
    fn test_missing_template_dir() {
        assert!(matches!(
            TemplateSet::builtin_with_overrides("/nonexistent/templates"),
            Err(RenderError::TemplateDir { .. })
        ));
    }
}
