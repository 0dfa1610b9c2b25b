//! `unitpm list` and `unitpm jlist`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use unitpm_core::{AppStatus, ProcessInfo};

use super::open_manager;

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "id")]
    id: u32,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "pid")]
    pid: u32,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "uptime")]
    uptime: String,
    #[tabled(rename = "memory")]
    memory: String,
    #[tabled(rename = "cpu")]
    cpu: String,
}

pub fn table() -> Result<()> {
    let (_, manager) = open_manager()?;
    let apps = manager.list().context("failed to list apps")?;
    if apps.is_empty() {
        println!("No apps defined.");
        println!("Run: unitpm start <script>");
        return Ok(());
    }

    let rows: Vec<ListRow> = apps
        .iter()
        .map(|p| ListRow {
            id: p.id,
            name: p.name.clone(),
            pid: p.pid,
            status: status_label(p.status),
            uptime: format_uptime(p.uptime_ms),
            memory: format_memory(p.memory),
            cpu: format!("{}%", p.cpu),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

pub fn jlist() -> Result<()> {
    let (_, manager) = open_manager()?;
    let apps = manager.list().context("failed to list apps")?;
    let payload: Vec<JlistEntry<'_>> = apps.iter().map(JlistEntry::from).collect();
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

pub(crate) fn status_label(status: AppStatus) -> String {
    match status {
        AppStatus::Online => status.as_str().green().bold().to_string(),
        AppStatus::Stopped => status.as_str().bright_black().bold().to_string(),
        AppStatus::Errored => status.as_str().red().bold().to_string(),
        AppStatus::Unknown => status.as_str().yellow().bold().to_string(),
    }
}

// ---------------------------------------------------------------------------
// PM2 JSON shape
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub(crate) struct JlistEntry<'a> {
    pid: u32,
    name: &'a str,
    pm2_env: Pm2Env<'a>,
    monit: Monit,
}

#[derive(Serialize)]
struct Pm2Env<'a> {
    pm_id: u32,
    name: &'a str,
    exec_mode: &'static str,
    status: AppStatus,
    pm_uptime: u64,
    created_at: i64,
    restart_time: u32,
    unstable_restarts: u32,
    pm_exec_path: &'a str,
    pm_cwd: Option<&'a Path>,
    pm_out_log_path: Option<&'a Path>,
    pm_err_log_path: Option<&'a Path>,
    pm_pid_path: &'a Path,
    interpreter: &'a str,
    args: &'a str,
    unit: &'a str,
    env: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct Monit {
    memory: u64,
    cpu: u8,
}

impl<'a> From<&'a ProcessInfo> for JlistEntry<'a> {
    fn from(p: &'a ProcessInfo) -> Self {
        JlistEntry {
            pid: p.pid,
            name: &p.name,
            pm2_env: Pm2Env {
                pm_id: p.id,
                name: &p.name,
                exec_mode: "fork",
                status: p.status,
                pm_uptime: p.uptime_ms,
                created_at: p.created_at_ms,
                restart_time: 0,
                unstable_restarts: 0,
                pm_exec_path: &p.script,
                pm_cwd: p.cwd.as_deref(),
                pm_out_log_path: p.out_log_path.as_deref(),
                pm_err_log_path: p.err_log_path.as_deref(),
                pm_pid_path: &p.pid_path,
                interpreter: &p.interpreter,
                args: &p.args,
                unit: &p.unit,
                env: &p.env,
            },
            monit: Monit {
                memory: p.memory,
                cpu: p.cpu,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Largest whole unit only: `3d`, `5h`, `12m`, `40s`.
pub fn format_uptime(uptime_ms: u64) -> String {
    let secs = uptime_ms / 1000;
    let (days, hours, minutes) = (secs / 86_400, secs / 3_600 % 24, secs / 60 % 60);
    if days > 0 {
        format!("{days}d")
    } else if hours > 0 {
        format!("{hours}h")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{}s", secs % 60)
    }
}

/// Binary units up to `gb`, three significant digits.
pub fn format_memory(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["b", "kb", "mb", "gb"];
    if bytes < 1024 {
        return format!("{bytes}b");
    }
    let mut exp = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exp < UNITS.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }
    let unit = UNITS[exp];
    if value >= 100.0 {
        format!("{value:.0}{unit}")
    } else if value >= 10.0 {
        format!("{value:.1}{unit}")
    } else {
        format!("{value:.2}{unit}")
    }
}
