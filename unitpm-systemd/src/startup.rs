//! Boot persistence for user-scope units: lingering plus `user@<uid>.service`.

use std::path::{Path, PathBuf};

use crate::error::SystemdError;
use crate::gateway::run_command;
use crate::paths::{current_uid, current_user, Scope};

pub const LINGER_DIR: &str = "/var/lib/systemd/linger";

/// Snapshot of what boot persistence currently looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupStatus {
    pub user: String,
    pub uid: u32,
    pub lingering: bool,
    /// Raw `systemctl is-enabled` answer for `user@<uid>.service`.
    pub user_service: String,
}

impl StartupStatus {
    pub fn is_configured(&self) -> bool {
        self.lingering && self.user_service == "enabled"
    }
}

/// `<linger_dir>/<user>`; systemd creates it when lingering is on.
pub fn linger_path_at(linger_dir: &Path, user: &str) -> PathBuf {
    linger_dir.join(user)
}

pub fn linger_path(user: &str) -> PathBuf {
    linger_path_at(Path::new(LINGER_DIR), user)
}

fn user_service(uid: u32) -> String {
    format!("user@{uid}.service")
}

/// Current lingering and user-manager state for the invoking user.
pub fn status() -> StartupStatus {
    let user = current_user();
    let uid = current_uid();
    let lingering = linger_path(&user).exists();
    let user_service = match run_command("systemctl", &["is-enabled", &user_service(uid)], true) {
        Ok(output) => {
            let state = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if state.is_empty() {
                "disabled".to_string()
            } else {
                state
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "is-enabled query failed");
            "disabled".to_string()
        }
    };
    StartupStatus {
        user,
        uid,
        lingering,
        user_service,
    }
}

/// Commands a user can run by hand to get the same result as [`configure`].
pub fn manual_commands(user: &str, uid: u32) -> Vec<String> {
    vec![
        format!("sudo loginctl enable-linger {user}"),
        format!("sudo systemctl enable {}", user_service(uid)),
        "systemctl --user daemon-reload".to_string(),
    ]
}

/// Enable lingering and the user manager, then reload it.
///
/// System-scope units start at boot already; nothing is run for them.
/// Steps that are already satisfied are skipped.
pub fn configure(scope: Scope) -> Result<(), SystemdError> {
    if scope == Scope::System {
        tracing::info!("system scope; startup configuration not needed");
        return Ok(());
    }

    let current = status();
    if !current.lingering {
        tracing::info!(user = %current.user, "enabling lingering");
        run_command("sudo", &["loginctl", "enable-linger", &current.user], false)?;
    }
    if current.user_service != "enabled" {
        let service = user_service(current.uid);
        tracing::info!(%service, "enabling user manager");
        run_command("sudo", &["systemctl", "enable", &service], false)?;
    }
    run_command("systemctl", &["--user", "daemon-reload"], false)?;
    Ok(())
}
