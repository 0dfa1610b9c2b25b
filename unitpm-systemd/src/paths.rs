//! Host layout: where unit files and app logs live, and which systemd
//! instance owns them.
//!
//! `Layout::at(home, scope)` is pure and used by tests; `Layout::detect()`
//! reads the real home directory, effective uid and `UNITPM_*` overrides.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use unitpm_core::DEFAULT_PREFIX;

use crate::error::SystemdError;

pub const ENV_SCOPE: &str = "UNITPM_SCOPE";
pub const ENV_UNIT_DIR: &str = "UNITPM_UNIT_DIR";
pub const ENV_LOG_DIR: &str = "UNITPM_LOG_DIR";
pub const ENV_PREFIX: &str = "UNITPM_PREFIX";

pub const SYSTEM_UNIT_DIR: &str = "/etc/systemd/system";

/// Which systemd instance manages the units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Per-user manager (`systemctl --user`), used when unprivileged.
    User,
    /// System manager, used when running as root.
    System,
}

impl Scope {
    /// `System` for euid 0, `User` otherwise.
    pub fn detect() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail.
        if unsafe { libc::geteuid() } == 0 {
            Scope::System
        } else {
            Scope::User
        }
    }

    /// Extra `systemctl` flag selecting this instance.
    pub fn systemctl_flag(&self) -> Option<&'static str> {
        match self {
            Scope::User => Some("--user"),
            Scope::System => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User => write!(f, "user"),
            Scope::System => write!(f, "system"),
        }
    }
}

impl FromStr for Scope {
    type Err = SystemdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Scope::User),
            "system" => Ok(Scope::System),
            other => Err(SystemdError::InvalidScope(other.to_string())),
        }
    }
}

/// Resolved locations for one unitpm instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub scope: Scope,
    pub unit_dir: PathBuf,
    pub log_dir: PathBuf,
    pub prefix: String,
    /// `User=` written into system-scope units.
    pub run_as: Option<String>,
}

impl Layout {
    /// Default layout under `home`. Pure; ignores the environment.
    pub fn at(home: &Path, scope: Scope) -> Self {
        let unit_dir = match scope {
            Scope::User => user_unit_dir(home),
            Scope::System => PathBuf::from(SYSTEM_UNIT_DIR),
        };
        let run_as = match scope {
            Scope::User => None,
            Scope::System => Some(current_user()),
        };
        Layout {
            scope,
            unit_dir,
            log_dir: logs_dir(home),
            prefix: DEFAULT_PREFIX.to_string(),
            run_as,
        }
    }

    /// Layout for the current process, honouring `UNITPM_*` overrides.
    pub fn detect() -> Result<Self, SystemdError> {
        let home = dirs::home_dir().ok_or(SystemdError::HomeNotFound)?;
        Self::from_lookup(&home, |key| std::env::var(key).ok())
    }

    /// [`Layout::detect`] with an explicit home and variable source.
    pub fn from_lookup(
        home: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SystemdError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let scope = match var(ENV_SCOPE) {
            Some(raw) => raw.parse()?,
            None => Scope::detect(),
        };
        let mut layout = Self::at(home, scope);
        if let Some(dir) = var(ENV_UNIT_DIR) {
            layout.unit_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var(ENV_LOG_DIR) {
            layout.log_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = var(ENV_PREFIX) {
            layout.prefix = prefix;
        }
        Ok(layout)
    }
}

/// `<home>/.config/systemd/user`
pub fn user_unit_dir(home: &Path) -> PathBuf {
    home.join(".config").join("systemd").join("user")
}

/// `<home>/.pm2/logs`
pub fn logs_dir(home: &Path) -> PathBuf {
    home.join(".pm2").join("logs")
}

/// `$USER`, falling back to `nobody`.
pub fn current_user() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "nobody".to_string())
}

/// Real uid of the current process.
pub fn current_uid() -> u32 {
    // SAFETY: getuid has no preconditions and cannot fail.
    unsafe { libc::getuid() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn user_layout_lives_under_home() {
        let layout = Layout::at(Path::new("/home/u"), Scope::User);
        assert_eq!(layout.unit_dir, PathBuf::from("/home/u/.config/systemd/user"));
        assert_eq!(layout.log_dir, PathBuf::from("/home/u/.pm2/logs"));
        assert_eq!(layout.prefix, "pm2-");
        assert!(layout.run_as.is_none());
    }

    #[test]
    fn system_layout_uses_etc_and_sets_user() {
        let layout = Layout::at(Path::new("/root"), Scope::System);
        assert_eq!(layout.unit_dir, PathBuf::from(SYSTEM_UNIT_DIR));
        assert!(layout.run_as.is_some());
    }

    #[test]
    fn overrides_apply() {
        let layout = Layout::from_lookup(
            Path::new("/home/u"),
            lookup(&[
                (ENV_SCOPE, "user"),
                (ENV_UNIT_DIR, "/tmp/units"),
                (ENV_LOG_DIR, "/tmp/logs"),
                (ENV_PREFIX, "app-"),
            ]),
        )
        .expect("layout");
        assert_eq!(layout.scope, Scope::User);
        assert_eq!(layout.unit_dir, PathBuf::from("/tmp/units"));
        assert_eq!(layout.log_dir, PathBuf::from("/tmp/logs"));
        assert_eq!(layout.prefix, "app-");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let layout = Layout::from_lookup(
            Path::new("/home/u"),
            lookup(&[(ENV_SCOPE, "system"), (ENV_UNIT_DIR, "  ")]),
        )
        .expect("layout");
        assert_eq!(layout.scope, Scope::System);
        assert_eq!(layout.unit_dir, PathBuf::from(SYSTEM_UNIT_DIR));
    }

    #[test]
    fn bad_scope_is_rejected() {
        let err = Layout::from_lookup(Path::new("/home/u"), lookup(&[(ENV_SCOPE, "global")]))
            .unwrap_err();
        assert!(matches!(err, SystemdError::InvalidScope(_)));
    }

    #[test]
    fn systemctl_flag_only_for_user() {
        assert_eq!(Scope::User.systemctl_flag(), Some("--user"));
        assert_eq!(Scope::System.systemctl_flag(), None);
    }
}
