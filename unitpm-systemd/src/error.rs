use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Error surface for init-system commands, log files and host layout.
#[derive(Debug, Error)]
pub enum SystemdError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program} {args}` failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        args: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("invalid scope '{0}'; expected: user, system")]
    InvalidScope(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SystemdError {
    SystemdError::Io {
        path: path.into(),
        source,
    }
}
