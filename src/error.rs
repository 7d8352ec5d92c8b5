//! Crate-level error type.
//!
//! Each pipeline stage has its own error enum; this wraps them so callers
//! driving the whole pipeline can use `?` across stages.

use std::fmt;
use std::io;

use crate::codegen::utils::single_line;
use crate::codegen::RenderError;
use crate::config::ConfigError;
use crate::context::ContextError;
use crate::source::SourceError;

#[derive(Debug)]
pub enum Error {
    Source(SourceError),
    Context(ContextError),
    Render(RenderError),
    Config(ConfigError),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Source(e) => write!(f, "Schema source error: {}", e),
            Error::Context(e) => write!(f, "Invalid context: {}", e),
            Error::Render(e) => write!(f, "Render error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl Error {
    /// The error message collapsed onto one line
    ///
    /// Driver messages can span several lines; the full text stays available
    /// through `Display` and the `source()` chain.
    pub fn summary(&self) -> String {
        single_line(&self.to_string())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Source(e) => Some(e),
            Error::Context(e) => Some(e),
            Error::Render(e) => Some(e),
            Error::Config(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        Error::Source(err)
    }
}

impl From<ContextError> for Error {
    fn from(err: ContextError) -> Self {
        Error::Context(err)
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        Error::Render(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
