//! Error types for Flint

use thiserror::Error;

/// The main error type for Flint operations
#[derive(Debug, Error)]
pub enum FlintError {
    #[error("Component clone failed for {component}: {reason}")]
    ComponentCloneFailed {
        component: &'static str,
        reason: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Duplicate key binding: {0}")]
    DuplicateKeyBinding(String),

    #[error("Key binding not found: {0}")]
    KeyBindingNotFound(String),

    #[error("Handler error: {0}")]
    HandlerError(String),

    #[error("{} event handler(s) failed: {}", .0.len(), summarize(.0))]
    Dispatch(Vec<FlintError>),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

/// Result type alias for Flint operations
pub type Result<T> = std::result::Result<T, FlintError>;

fn summarize(errors: &[FlintError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl FlintError {
    /// Collapse a list of handler failures into a single result
    pub fn from_failures(failures: Vec<FlintError>) -> Result<()> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(FlintError::Dispatch(failures))
        }
    }
}

impl From<toml::de::Error> for FlintError {
    fn from(err: toml::de::Error) -> Self {
        FlintError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for FlintError {
    fn from(err: toml::ser::Error) -> Self {
        FlintError::TomlSerError(err.to_string())
    }
}
