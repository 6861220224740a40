use std::path::PathBuf;
use thiserror::Error;

use super::ConfigLevel;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Coarse classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The name (or level) is absent everywhere that was searched.
    NotFound,
    /// A value exists but cannot be converted to the requested type.
    Parse,
    /// The storage behind a level failed to open, read, write or refresh.
    Backend,
    /// The caller passed something the operation cannot accept.
    InvalidArgument,
    /// The backend was released by its owner.
    Closed,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config value '{0}' was not found")]
    NotFound(String),

    #[error("no config file is bound at level {0}")]
    LevelNotFound(ConfigLevel),

    #[error("failed to parse config value '{name}' = '{value}' as {expected}")]
    Parse {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    MalformedFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid content in config file '{path}': {message}")]
    InvalidContent { path: PathBuf, message: String },

    #[error("failed to serialize config file '{path}': {source}")]
    SerializeError {
        path: PathBuf,
        source: toml::ser::Error,
    },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid config name '{0}'")]
    InvalidName(String),

    #[error("invalid value pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("config value '{0}' has multiple values")]
    MultivarNotUnique(String),

    #[error("level {0} is already bound to another backend")]
    LevelOccupied(ConfigLevel),

    #[error("no level is available for writing")]
    NoWritableLevel,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config backend has been released by its owner")]
    Closed,
}

impl ConfigError {
    pub(crate) fn parse(name: &str, value: &str, expected: &'static str) -> Self {
        Self::Parse {
            name: name.to_string(),
            value: value.to_string(),
            expected,
        }
    }

    /// Classifies this error into one of the coarse [`ErrorKind`]s.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::LevelNotFound(_) => ErrorKind::NotFound,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::ReadError { .. }
            | Self::WriteError { .. }
            | Self::MalformedFile { .. }
            | Self::InvalidContent { .. }
            | Self::SerializeError { .. }
            | Self::Backend(_) => ErrorKind::Backend,
            Self::InvalidName(_)
            | Self::InvalidPattern { .. }
            | Self::MultivarNotUnique(_)
            | Self::LevelOccupied(_)
            | Self::NoWritableLevel
            | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Closed => ErrorKind::Closed,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
