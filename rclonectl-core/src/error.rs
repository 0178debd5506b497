//! Error types for rclonectl-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file not found at {path}")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure reading the configuration file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The INI document could not be parsed.
    #[error("failed to load configuration{}: {source}", describe_path(.path))]
    Load {
        path: Option<PathBuf>,
        #[source]
        source: ini::ParseError,
    },

    /// `[section] key` is not declared (directly or through a `${...}` reference).
    #[error("missing configuration key [{section}] {key}")]
    MissingKey { section: String, key: String },

    /// A value contains a malformed `$` expression.
    #[error("bad interpolation in [{section}] {key}: {reason}")]
    Interpolation {
        section: String,
        key: String,
        reason: String,
    },

    /// `${...}` references nest deeper than the interpolation limit (likely a cycle).
    #[error("interpolation depth exceeded in [{section}] {key}")]
    InterpolationDepth { section: String, key: String },

    /// A value is present but cannot be converted to the expected type.
    #[error("invalid value for [{section}] {key}: {value:?} ({reason})")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

fn describe_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" from {}", p.display()))
        .unwrap_or_default()
}

impl ConfigError {
    pub fn missing(section: &str, key: &str) -> Self {
        ConfigError::MissingKey {
            section: section.to_owned(),
            key: key.to_owned(),
        }
    }
}
