//! Domain types for unitpm.
//!
//! Three layers of state flow through the system:
//! - [`AppConfig`]: desired state supplied by the caller, consumed once at creation.
//! - [`UnitDescriptor`]: the fixed schema of a persisted unit file.
//! - [`ProcessInfo`]: observed state, recomputed on every query and never persisted.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

/// Restart delay written into every unit, in seconds.
pub const RESTART_SEC: u32 = 3;

// ---------------------------------------------------------------------------
// Desired state
// ---------------------------------------------------------------------------

/// Desired-state configuration for one application.
///
/// Field names follow PM2 ecosystem files so descriptors can be loaded as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// `0` means "assign automatically".
    #[serde(default)]
    pub id: u32,
    pub name: String,
    pub script: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Flattened argument string. Descriptors may also give a list.
    #[serde(
        default,
        deserialize_with = "deserialize_args",
        skip_serializing_if = "String::is_empty"
    )]
    pub args: String,
    #[serde(
        default,
        deserialize_with = "deserialize_env",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub env: BTreeMap<String, String>,
}

impl AppConfig {
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            ..Self::default()
        }
    }
}

/// Multi-app descriptor: every record is submitted independently.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EcosystemConfig {
    #[serde(default)]
    pub apps: Vec<AppConfig>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArgsRepr {
    Line(String),
    List(Vec<String>),
}

fn deserialize_args<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ArgsRepr>::deserialize(deserializer)? {
        None => String::new(),
        Some(ArgsRepr::Line(line)) => line,
        Some(ArgsRepr::List(items)) => items.join(" "),
    })
}

/// Scalar env values: PM2 descriptors commonly write `PORT: 3000`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EnvValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<EnvValue> for String {
    fn from(v: EnvValue) -> Self {
        match v {
            EnvValue::Str(s) => s,
            EnvValue::Int(i) => i.to_string(),
            EnvValue::Float(f) => f.to_string(),
            EnvValue::Bool(b) => b.to_string(),
        }
    }
}

fn deserialize_env<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, EnvValue>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, String::from(v)))
        .collect())
}

// ---------------------------------------------------------------------------
// Persisted unit schema
// ---------------------------------------------------------------------------

/// The fixed schema of a unit file owned by unitpm.
///
/// `script`, `interpreter` and `args` are the caller's original values; the
/// resolved command line lives in `exec_start`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitDescriptor {
    pub unit_name: String,
    pub description: String,
    pub working_dir: Option<PathBuf>,
    pub exec_start: String,
    pub user: Option<String>,
    pub restart_sec: u32,
    pub out_log: Option<PathBuf>,
    pub err_log: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub script: String,
    pub interpreter: Option<String>,
    pub args: String,
}

impl UnitDescriptor {
    /// Synthetic pid-file path; derived whether or not one exists.
    pub fn pid_path(&self) -> PathBuf {
        PathBuf::from(format!("/tmp/{}.pid", self.unit_name))
    }

    /// Flatten into the transient view used by list and logs.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            script: self.script.clone(),
            interpreter: self.interpreter.clone().unwrap_or_default(),
            args: self.args.clone(),
            env: self.env.clone(),
            working_dir: self.working_dir.clone(),
            exec_start: self.exec_start.clone(),
            out_log_path: self.out_log.clone(),
            err_log_path: self.err_log.clone(),
            pid_path: self.pid_path(),
        }
    }
}

/// Result of reverse-parsing a unit file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceConfig {
    pub script: String,
    pub interpreter: String,
    pub args: String,
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub exec_start: String,
    pub out_log_path: Option<PathBuf>,
    pub err_log_path: Option<PathBuf>,
    pub pid_path: PathBuf,
}

// ---------------------------------------------------------------------------
// Observed state
// ---------------------------------------------------------------------------

/// Four-way liveness derived from the init system's native unit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Online,
    Stopped,
    Errored,
    #[default]
    Unknown,
}

impl AppStatus {
    /// Map a systemd `ActiveState` string.
    pub fn from_unit_state(state: &str) -> Self {
        match state.trim() {
            "active" => AppStatus::Online,
            "inactive" => AppStatus::Stopped,
            "failed" => AppStatus::Errored,
            _ => AppStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Online => "online",
            AppStatus::Stopped => "stopped",
            AppStatus::Errored => "errored",
            AppStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merged view of one app: unit contents plus live kernel/init-system values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    pub id: u32,
    pub name: String,
    pub unit: String,
    /// `0` when not running.
    pub pid: u32,
    pub status: AppStatus,
    /// Milliseconds since last activation; `0` when inactive.
    pub uptime_ms: u64,
    /// Unix milliseconds, `now - uptime`.
    pub created_at_ms: i64,
    /// Resident set size in bytes.
    pub memory: u64,
    /// Average CPU percent since process start, `0..=100`.
    pub cpu: u8,
    pub script: String,
    pub interpreter: String,
    pub args: String,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub exec_start: String,
    pub out_log_path: Option<PathBuf>,
    pub err_log_path: Option<PathBuf>,
    pub pid_path: PathBuf,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
