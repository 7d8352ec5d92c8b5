//! Output sinks for generated artifacts.
//!
//! Artifacts land at `<root>/<kind dir>/<file name>`:
//!
//! ```text
//! generated/
//! ├── entities/patients.rs
//! ├── dtos/patients_dtos.rs
//! ├── handlers/patients_handlers.rs
//! └── patients_mod.rs
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::codegen::fs_utils::{with_trailing_newline, write_file};
use crate::codegen::Artifact;

/// Destination for rendered artifacts
pub trait OutputSink {
    /// Persist one artifact and return where it went
    fn write(&mut self, artifact: &Artifact) -> io::Result<PathBuf>;

    /// Persist artifacts in order, stopping at the first failure
    fn write_all(&mut self, artifacts: &[Artifact]) -> io::Result<Vec<PathBuf>> {
        artifacts.iter().map(|a| self.write(a)).collect()
    }
}

/// Writes artifacts under a root directory
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for FsSink {
    fn write(&mut self, artifact: &Artifact) -> io::Result<PathBuf> {
        let path = self.root.join(artifact.relative_path());
        write_file(&path, with_trailing_newline(&artifact.contents))?;
        tracing::info!(path = %path.display(), kind = ?artifact.kind, "wrote artifact");
        Ok(path)
    }
}

/// Keeps artifacts in memory, keyed by relative path
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub written: Vec<(PathBuf, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents written at `path`, if any
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.written
            .iter()
            .rev()
            .find(|(p, _)| p == path.as_ref())
            .map(|(_, text)| text.as_str())
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, artifact: &Artifact) -> io::Result<PathBuf> {
        let path = artifact.relative_path();
        self.written
            .push((path.clone(), with_trailing_newline(&artifact.contents)));
        Ok(path)
    }
}
