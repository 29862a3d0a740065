//! Error types for openclaw-core

use thiserror::Error;

/// Result type alias using openclaw-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for OpenClaw tooling
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid settings file or override
    #[error("Invalid settings: {message}")]
    InvalidSettings { message: String },

    /// YAML parsing error
    #[error("YAML parsing error in {path}: {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    /// Home directory could not be determined
    #[error("Could not determine home directory")]
    HomeNotFound,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid settings error
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: message.into(),
        }
    }

    /// Create a YAML parse error for the given file
    pub fn yaml_parse(path: impl Into<String>, source: serde_yaml_ng::Error) -> Self {
        Self::YamlParse {
            path: path.into(),
            source,
        }
    }
}
