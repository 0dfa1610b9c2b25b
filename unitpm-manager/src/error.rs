//! Error types for unitpm-manager.

use std::path::PathBuf;

use thiserror::Error;

use unitpm_core::CoreError;
use unitpm_renderer::RenderError;
use unitpm_systemd::SystemdError;

/// Everything a registry operation can fail with.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// An app with this name is already defined.
    #[error("app '{name}' already exists (id {id})")]
    DuplicateName { name: String, id: u32 },

    /// No defined app matches the name or id.
    #[error("app '{identifier}' not found")]
    NotFound { identifier: String },

    /// App names become part of a unit name.
    #[error("invalid app name '{name}': use only ASCII letters, digits, ':', '_', '.' and '-'")]
    InvalidName { name: String },

    /// The app's unit records no log files.
    #[error("no log files recorded for app '{name}'")]
    LogsUnavailable { name: String },

    /// Unit file write, read or remove failed.
    #[error("unit file error at {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    InvalidFormat(#[from] CoreError),

    #[error("init system error: {0}")]
    Gateway(#[from] SystemdError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

pub(crate) fn persist_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManagerError {
    ManagerError::Persistence {
        path: path.into(),
        source,
    }
}
