//! Init-system gateway: the only place that shells out to `systemctl` and `tail`.
//!
//! [`InitSystem`] is the seam the manager calls through; [`Systemctl`] is the
//! real implementation. Every call blocks until the child process exits.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use unitpm_core::AppStatus;

use crate::error::SystemdError;
use crate::logs;
use crate::paths::Scope;

/// State change requested from the init system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitAction {
    Start,
    Stop,
    Restart,
    Enable,
    Disable,
}

impl UnitAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitAction::Start => "start",
            UnitAction::Stop => "stop",
            UnitAction::Restart => "restart",
            UnitAction::Enable => "enable",
            UnitAction::Disable => "disable",
        }
    }
}

/// Capability surface the manager needs from the init system.
pub trait InitSystem {
    /// Re-read unit files (`daemon-reload`).
    fn reload(&self) -> Result<(), SystemdError>;

    /// Apply `action` to `unit`.
    fn set_unit_state(&self, unit: &str, action: UnitAction) -> Result<(), SystemdError>;

    /// Raw value of a unit property, trimmed.
    fn query_unit_property(&self, unit: &str, key: &str) -> Result<String, SystemdError>;

    /// Liveness of `unit`. Never fails; unreachable init systems read as `Unknown`.
    fn is_active(&self, unit: &str) -> AppStatus;

    /// Print the last `lines` lines of each file, then keep streaming if `follow`.
    fn tail(&self, files: &[PathBuf], lines: usize, follow: bool) -> Result<(), SystemdError>;
}

impl<T: InitSystem + ?Sized> InitSystem for &T {
    fn reload(&self) -> Result<(), SystemdError> {
        (**self).reload()
    }

    fn set_unit_state(&self, unit: &str, action: UnitAction) -> Result<(), SystemdError> {
        (**self).set_unit_state(unit, action)
    }

    fn query_unit_property(&self, unit: &str, key: &str) -> Result<String, SystemdError> {
        (**self).query_unit_property(unit, key)
    }

    fn is_active(&self, unit: &str) -> AppStatus {
        (**self).is_active(unit)
    }

    fn tail(&self, files: &[PathBuf], lines: usize, follow: bool) -> Result<(), SystemdError> {
        (**self).tail(files, lines, follow)
    }
}

/// [`InitSystem`] backed by the `systemctl` binary.
#[derive(Debug, Clone, Copy)]
pub struct Systemctl {
    scope: Scope,
}

impl Systemctl {
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    fn args<'a>(&self, rest: &[&'a str]) -> Vec<&'a str> {
        let mut args: Vec<&'a str> = self.scope.systemctl_flag().into_iter().collect();
        args.extend_from_slice(rest);
        args
    }

    fn systemctl(&self, rest: &[&str]) -> Result<Output, SystemdError> {
        run_command("systemctl", &self.args(rest), false)
    }
}

impl InitSystem for Systemctl {
    fn reload(&self) -> Result<(), SystemdError> {
        self.systemctl(&["daemon-reload"]).map(drop)
    }

    fn set_unit_state(&self, unit: &str, action: UnitAction) -> Result<(), SystemdError> {
        self.systemctl(&[action.as_str(), unit]).map(drop)
    }

    fn query_unit_property(&self, unit: &str, key: &str) -> Result<String, SystemdError> {
        let property = format!("--property={key}");
        let output = self.systemctl(&["show", unit, &property, "--value"])?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn is_active(&self, unit: &str) -> AppStatus {
        // `is-active` exits non-zero for anything but "active"; the state is on stdout.
        match run_command("systemctl", &self.args(&["is-active", unit]), true) {
            Ok(output) => AppStatus::from_unit_state(&String::from_utf8_lossy(&output.stdout)),
            Err(err) => {
                tracing::warn!(unit, error = %err, "is-active query failed");
                AppStatus::Unknown
            }
        }
    }

    fn tail(&self, files: &[PathBuf], lines: usize, follow: bool) -> Result<(), SystemdError> {
        if !follow {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for file in files {
                logs::print_tail(&mut out, file, lines)?;
            }
            return out.flush().map_err(|e| crate::error::io_err("stdout", e));
        }

        let mut args = vec!["-n".to_string(), lines.to_string(), "-F".to_string()];
        args.extend(files.iter().map(|f| f.display().to_string()));
        tracing::debug!(?args, "spawning tail");
        let status = Command::new("tail")
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| SystemdError::Launch {
                program: "tail".to_string(),
                source,
            })?;
        if status.success() {
            return Ok(());
        }
        Err(SystemdError::CommandFailed {
            program: "tail".to_string(),
            args: args.join(" "),
            status,
            stderr: String::new(),
        })
    }
}

/// Run `program args…`, capturing output.
///
/// With `allow_failure` a non-zero exit is returned as `Ok`.
pub(crate) fn run_command(
    program: &str,
    args: &[&str],
    allow_failure: bool,
) -> Result<Output, SystemdError> {
    tracing::debug!(program, ?args, "running command");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| SystemdError::Launch {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() || allow_failure {
        return Ok(output);
    }

    Err(SystemdError::CommandFailed {
        program: program.to_string(),
        args: args.join(" "),
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Parse a systemd timestamp property such as `Sun 2026-10-18 09:30:00 UTC`.
///
/// `UTC`/`GMT` zones are taken literally, any other zone is read as local
/// time. `@<unix seconds>` is also accepted. Empty and `n/a` yield `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "n/a" {
        return None;
    }
    if let Some(secs) = raw.strip_prefix('@') {
        let secs: i64 = secs.split('.').next()?.parse().ok()?;
        return Utc.timestamp_opt(secs, 0).single();
    }

    let words: Vec<&str> = raw.split_whitespace().collect();
    let (date, time, zone) = match words.as_slice() {
        [_, date, time, zone] => (*date, *time, Some(*zone)),
        [_, date, time] => (*date, *time, None),
        _ => return None,
    };
    let naive = NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").ok()?;
    match zone {
        Some("UTC") | Some("GMT") => Some(Utc.from_utc_datetime(&naive)),
        _ => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}
