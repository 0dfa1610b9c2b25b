//! Error types for unitpm-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by naming and ecosystem handling.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The unit name does not carry the configured prefix.
    #[error("invalid unit name format: {unit}")]
    InvalidFormat { unit: String },

    /// Underlying I/O failure while reading an ecosystem file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Ecosystem file is not valid JSON.
    #[error("failed to parse ecosystem JSON at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Ecosystem file is not valid YAML.
    #[error("failed to parse ecosystem YAML at {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `ecosystem.config.js` and friends.
    #[error("JavaScript ecosystem files are not supported: {path}; convert it to .json or .yaml")]
    JavaScriptEcosystem { path: PathBuf },

    /// Ecosystem file extension is neither JSON nor YAML.
    #[error("unsupported ecosystem file {path}; expected .json, .yaml or .yml")]
    UnsupportedEcosystem { path: PathBuf },
}
