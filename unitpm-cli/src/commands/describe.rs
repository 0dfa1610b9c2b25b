//! `unitpm describe` and `unitpm env`.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use unitpm_core::ProcessInfo;

use super::control::TargetArgs;
use super::list::{format_memory, format_uptime, status_label};
use super::open_manager;

#[derive(Tabled)]
struct Field {
    #[tabled(rename = "key")]
    key: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

#[derive(Tabled)]
struct EnvRow {
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "value")]
    value: String,
}

pub fn describe(args: TargetArgs) -> Result<()> {
    let (_, manager) = open_manager()?;
    let info = manager
        .describe(&args.identifier())
        .with_context(|| format!("failed to describe '{}'", args.target))?;

    println!(
        "Describing app with id {} - name {}",
        info.id,
        info.name.bold()
    );
    let mut table = Table::new(fields(&info));
    table.with(Style::rounded());
    println!("{table}");

    if !info.env.is_empty() {
        println!("{}", "Environment".bold());
        print_env(&info);
    }
    Ok(())
}

pub fn env(args: TargetArgs) -> Result<()> {
    let (_, manager) = open_manager()?;
    let info = manager
        .describe(&args.identifier())
        .with_context(|| format!("failed to read environment of '{}'", args.target))?;
    if info.env.is_empty() {
        println!("No environment set for {}.", info.name);
        return Ok(());
    }
    print_env(&info);
    Ok(())
}

fn print_env(info: &ProcessInfo) {
    let rows: Vec<EnvRow> = info
        .env
        .iter()
        .map(|(key, value)| EnvRow {
            key: key.clone(),
            value: value.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn fields(info: &ProcessInfo) -> Vec<Field> {
    let or_na = |s: &str| {
        if s.is_empty() {
            "N/A".to_string()
        } else {
            s.to_string()
        }
    };
    let path_or_na = |p: Option<&Path>| p.map_or_else(|| "N/A".to_string(), |p| p.display().to_string());

    vec![
        Field { key: "status", value: status_label(info.status) },
        Field { key: "name", value: info.name.clone() },
        Field { key: "id", value: info.id.to_string() },
        Field { key: "unit", value: info.unit.clone() },
        Field { key: "pid", value: info.pid.to_string() },
        Field { key: "uptime", value: format_uptime(info.uptime_ms) },
        Field { key: "memory", value: format_memory(info.memory) },
        Field { key: "cpu", value: format!("{}%", info.cpu) },
        Field { key: "script path", value: or_na(&info.script) },
        Field { key: "script args", value: or_na(&info.args) },
        Field { key: "interpreter", value: or_na(&info.interpreter) },
        Field { key: "exec start", value: or_na(&info.exec_start) },
        Field { key: "exec cwd", value: path_or_na(info.cwd.as_deref()) },
        Field { key: "out log path", value: path_or_na(info.out_log_path.as_deref()) },
        Field { key: "error log path", value: path_or_na(info.err_log_path.as_deref()) },
        Field { key: "pid path", value: info.pid_path.display().to_string() },
        Field { key: "exec mode", value: "fork_mode".to_string() },
        Field { key: "created at", value: format_created_at(info) },
    ]
}

fn format_created_at(info: &ProcessInfo) -> String {
    if info.uptime_ms == 0 {
        return "N/A".to_string();
    }
    Utc.timestamp_millis_opt(info.created_at_ms)
        .single()
        .map(|t| t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
