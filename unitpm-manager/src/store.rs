//! Unit-file directory: the registry's only persistent state.
//!
//! # Storage layout
//!
//! ```text
//! <unit_dir>/
//!   {prefix}{id}-{name}.service   (one file per app, mode 0644)
//! ```
//!
//! Writes go through `.<file>.tmp` and a rename so systemd never reads a
//! half-written unit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use unitpm_core::UnitNaming;

use crate::error::{persist_err, ManagerError};

/// Read/write access to one unit directory.
#[derive(Debug, Clone)]
pub struct UnitStore {
    dir: PathBuf,
}

impl UnitStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<unit_dir>/<file_name>`, no I/O.
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Sorted file names owned by `naming`. A missing directory is empty.
    pub fn list(&self, naming: &UnitNaming) -> Result<Vec<String>, ManagerError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(persist_err(&self.dir, e)),
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| naming.owns_file(name))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn read(&self, file_name: &str) -> Result<String, ManagerError> {
        let path = self.path_of(file_name);
        fs::read_to_string(&path).map_err(|e| persist_err(path, e))
    }

    /// Atomically replace `file_name` with `content`.
    pub fn write(&self, file_name: &str, content: &str) -> Result<PathBuf, ManagerError> {
        fs::create_dir_all(&self.dir).map_err(|e| persist_err(&self.dir, e))?;
        let path = self.path_of(file_name);
        let tmp = self.dir.join(format!(".{file_name}.tmp"));

        fs::write(&tmp, content).map_err(|e| persist_err(&tmp, e))?;
        set_unit_permissions(&tmp)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(persist_err(path, e));
        }
        tracing::info!(path = %path.display(), "wrote unit");
        Ok(path)
    }

    /// Remove `file_name`; an already-missing file is not an error.
    pub fn remove(&self, file_name: &str) -> Result<(), ManagerError> {
        let path = self.path_of(file_name);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed unit");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(persist_err(path, e)),
        }
    }
}

#[cfg(unix)]
fn set_unit_permissions(path: &Path) -> Result<(), ManagerError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644)).map_err(|e| persist_err(path, e))
}
#[cfg(not(unix))]
fn set_unit_permissions(_path: &Path) -> Result<(), ManagerError> {
    Ok(())
}
