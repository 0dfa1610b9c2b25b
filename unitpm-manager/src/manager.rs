//! The registry: apps as unit files, reconciled with live init-system and
//! kernel state on every call.
//!
//! Nothing is cached between calls. Each operation re-reads the unit
//! directory, so two concurrent `start`s with the same new name can both pass
//! the duplicate check.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use unitpm_core::naming::UNIT_SUFFIX;
use unitpm_core::{AppConfig, AppStatus, EcosystemConfig, Identifier, ProcessInfo, UnitNaming};
use unitpm_renderer::{parser, RenderOptions, UnitRenderer};
use unitpm_systemd::{logs, parse_timestamp, InitSystem, Layout, ProcReader, UnitAction};

use crate::error::{persist_err, ManagerError};
use crate::store::UnitStore;

const PROP_MAIN_PID: &str = "MainPID";
const PROP_ACTIVE_ENTER: &str = "ActiveEnterTimestamp";

/// One defined app, as decoded from its unit file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    pub id: u32,
    pub name: String,
    /// Unit name without `.service`.
    pub unit: String,
    pub file_name: String,
}

/// Registry over one unit directory and one init system.
pub struct Manager<G> {
    init: G,
    store: UnitStore,
    naming: UnitNaming,
    renderer: UnitRenderer,
    proc_reader: ProcReader,
    render_opts: RenderOptions,
}

impl<G: InitSystem> Manager<G> {
    /// Manager for `layout`, rendering with interpreters found on `PATH` and
    /// sampling the live `/proc`.
    pub fn new(layout: &Layout, init: G) -> Result<Self, ManagerError> {
        let default_cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Ok(Self {
            init,
            store: UnitStore::new(&layout.unit_dir),
            naming: UnitNaming::new(layout.prefix.clone()),
            renderer: UnitRenderer::new()?,
            proc_reader: ProcReader::system(),
            render_opts: RenderOptions {
                log_dir: layout.log_dir.clone(),
                default_cwd,
                user: layout.run_as.clone(),
            },
        })
    }

    pub fn with_renderer(mut self, renderer: UnitRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_proc_reader(mut self, proc_reader: ProcReader) -> Self {
        self.proc_reader = proc_reader;
        self
    }

    /// Working directory for apps started without `cwd`.
    pub fn with_default_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.render_opts.default_cwd = cwd.into();
        self
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    /// Every defined app, ordered by id then name. Undecodable files are skipped.
    pub fn entries(&self) -> Result<Vec<AppEntry>, ManagerError> {
        let mut entries = Vec::new();
        for file_name in self.store.list(&self.naming)? {
            let unit = file_name
                .strip_suffix(UNIT_SUFFIX)
                .unwrap_or(&file_name)
                .to_string();
            match self.naming.decode(&unit) {
                Ok((id, name)) => entries.push(AppEntry {
                    id,
                    name,
                    unit,
                    file_name,
                }),
                Err(err) => tracing::warn!(file = %file_name, error = %err, "skipping unit file"),
            }
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    /// First entry matching `identifier`.
    pub fn resolve(&self, identifier: &Identifier) -> Result<AppEntry, ManagerError> {
        self.entries()?
            .into_iter()
            .find(|e| identifier.matches(e.id, &e.name))
            .ok_or_else(|| ManagerError::NotFound {
                identifier: identifier.to_string(),
            })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Define and launch a new app.
    ///
    /// Any existing entry with the same name blocks the create, whatever its
    /// status. Steps run write → reload → start → enable; a failing step
    /// leaves the earlier ones applied.
    pub fn start(&self, config: &AppConfig) -> Result<AppEntry, ManagerError> {
        validate_name(&config.name)?;
        let entries = self.entries()?;
        if let Some(existing) = entries.iter().find(|e| e.name == config.name) {
            return Err(ManagerError::DuplicateName {
                name: config.name.clone(),
                id: existing.id,
            });
        }

        let id = if config.id != 0 {
            config.id
        } else {
            next_id(&entries)
        };

        let log_dir = &self.render_opts.log_dir;
        fs::create_dir_all(log_dir).map_err(|e| persist_err(log_dir, e))?;

        let unit = self.naming.encode(id, &config.name);
        let (_, text) = self.renderer.render_app(&unit, config, &self.render_opts)?;
        let file_name = self.naming.file_name(id, &config.name);
        self.store.write(&file_name, &text)?;

        self.init.reload()?;
        self.init.set_unit_state(&unit, UnitAction::Start)?;
        self.init.set_unit_state(&unit, UnitAction::Enable)?;

        tracing::info!(id, name = %config.name, %unit, "started app");
        Ok(AppEntry {
            id,
            name: config.name.clone(),
            unit,
            file_name,
        })
    }

    /// [`Self::start`] for each app in turn; one failure does not stop the rest.
    pub fn start_ecosystem(
        &self,
        ecosystem: &EcosystemConfig,
    ) -> Vec<(String, Result<AppEntry, ManagerError>)> {
        ecosystem
            .apps
            .iter()
            .map(|app| {
                let outcome = self.start(app);
                if let Err(err) = &outcome {
                    tracing::warn!(name = %app.name, error = %err, "ecosystem app failed to start");
                }
                (app.name.clone(), outcome)
            })
            .collect()
    }

    pub fn stop(&self, identifier: &Identifier) -> Result<AppEntry, ManagerError> {
        self.apply(identifier, UnitAction::Stop)
    }

    pub fn restart(&self, identifier: &Identifier) -> Result<AppEntry, ManagerError> {
        self.apply(identifier, UnitAction::Restart)
    }

    /// Restart every defined app; one failure does not stop the rest.
    pub fn restart_all(&self) -> Result<Vec<(AppEntry, Result<(), ManagerError>)>, ManagerError> {
        let outcomes = self
            .entries()?
            .into_iter()
            .map(|entry| {
                let outcome = self
                    .init
                    .set_unit_state(&entry.unit, UnitAction::Restart)
                    .map_err(ManagerError::from);
                match &outcome {
                    Ok(()) => tracing::info!(unit = %entry.unit, "restarted app"),
                    Err(err) => tracing::warn!(unit = %entry.unit, error = %err, "restart failed"),
                }
                (entry, outcome)
            })
            .collect();
        Ok(outcomes)
    }

    fn apply(&self, identifier: &Identifier, action: UnitAction) -> Result<AppEntry, ManagerError> {
        let entry = self.resolve(identifier)?;
        self.init.set_unit_state(&entry.unit, action)?;
        tracing::info!(unit = %entry.unit, action = action.as_str(), "applied action");
        Ok(entry)
    }

    /// Stop, disable and forget one app.
    pub fn delete(&self, identifier: &Identifier) -> Result<AppEntry, ManagerError> {
        let entry = self.resolve(identifier)?;
        self.remove_entry(&entry)?;
        self.init.reload()?;
        Ok(entry)
    }

    /// [`Self::delete`] for every defined app. Not transactional.
    pub fn delete_all(&self) -> Result<Vec<AppEntry>, ManagerError> {
        let entries = self.entries()?;
        for entry in &entries {
            self.remove_entry(entry)?;
        }
        if !entries.is_empty() {
            self.init.reload()?;
        }
        Ok(entries)
    }

    fn remove_entry(&self, entry: &AppEntry) -> Result<(), ManagerError> {
        for action in [UnitAction::Stop, UnitAction::Disable] {
            if let Err(err) = self.init.set_unit_state(&entry.unit, action) {
                tracing::warn!(
                    unit = %entry.unit,
                    action = action.as_str(),
                    error = %err,
                    "ignoring cleanup failure"
                );
            }
        }
        self.store.remove(&entry.file_name)
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Merged view of every defined app, stopped ones included.
    pub fn list(&self) -> Result<Vec<ProcessInfo>, ManagerError> {
        let now = Utc::now();
        Ok(self
            .entries()?
            .iter()
            .map(|entry| self.inspect(entry, now))
            .collect())
    }

    pub fn describe(&self, identifier: &Identifier) -> Result<ProcessInfo, ManagerError> {
        let entry = self.resolve(identifier)?;
        Ok(self.inspect(&entry, Utc::now()))
    }

    fn inspect(&self, entry: &AppEntry, now: DateTime<Utc>) -> ProcessInfo {
        let svc = parser::parse(&entry.unit, &self.unit_text(entry)).service_config();
        let status = self.init.is_active(&entry.unit);
        let pid = self.main_pid(&entry.unit);
        let uptime_ms = if status == AppStatus::Online {
            self.uptime_ms(&entry.unit, now)
        } else {
            0
        };

        ProcessInfo {
            id: entry.id,
            name: entry.name.clone(),
            unit: entry.unit.clone(),
            pid,
            status,
            uptime_ms,
            created_at_ms: now.timestamp_millis().saturating_sub(uptime_ms as i64),
            memory: self.proc_reader.memory(pid),
            cpu: self.proc_reader.cpu_percent(pid),
            script: svc.script,
            interpreter: svc.interpreter,
            args: svc.args,
            env: svc.env,
            cwd: svc.working_dir,
            exec_start: svc.exec_start,
            out_log_path: svc.out_log_path,
            err_log_path: svc.err_log_path,
            pid_path: svc.pid_path,
        }
    }

    /// Unit text, or empty when unreadable so one bad file cannot break a listing.
    fn unit_text(&self, entry: &AppEntry) -> String {
        self.store.read(&entry.file_name).unwrap_or_else(|err| {
            tracing::warn!(file = %entry.file_name, error = %err, "unreadable unit file");
            String::new()
        })
    }

    fn main_pid(&self, unit: &str) -> u32 {
        match self.init.query_unit_property(unit, PROP_MAIN_PID) {
            Ok(raw) => raw.trim().parse().unwrap_or(0),
            Err(err) => {
                tracing::warn!(unit, error = %err, "MainPID query failed");
                0
            }
        }
    }

    fn uptime_ms(&self, unit: &str, now: DateTime<Utc>) -> u64 {
        let raw = match self.init.query_unit_property(unit, PROP_ACTIVE_ENTER) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(unit, error = %err, "ActiveEnterTimestamp query failed");
                return 0;
            }
        };
        parse_timestamp(&raw)
            .map(|since| (now - since).num_milliseconds().max(0) as u64)
            .unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Logs
    // -----------------------------------------------------------------------

    /// Log files for one app, or for every app when `identifier` is `None`.
    pub fn log_targets(&self, identifier: Option<&Identifier>) -> Result<Vec<PathBuf>, ManagerError> {
        match identifier {
            Some(identifier) => {
                let entry = self.resolve(identifier)?;
                let files = self.log_files(&entry);
                if files.is_empty() {
                    return Err(ManagerError::LogsUnavailable { name: entry.name });
                }
                Ok(files)
            }
            None => Ok(self
                .entries()?
                .iter()
                .flat_map(|entry| self.log_files(entry))
                .collect()),
        }
    }

    fn log_files(&self, entry: &AppEntry) -> Vec<PathBuf> {
        let unit = parser::parse(&entry.unit, &self.unit_text(entry));
        [unit.out_log, unit.err_log].into_iter().flatten().collect()
    }

    /// Tail the resolved log files. Returns them; nothing is tailed when empty.
    pub fn logs(
        &self,
        identifier: Option<&Identifier>,
        lines: usize,
        follow: bool,
    ) -> Result<Vec<PathBuf>, ManagerError> {
        let files = self.log_targets(identifier)?;
        if !files.is_empty() {
            self.init.tail(&files, lines, follow)?;
        }
        Ok(files)
    }

    /// Truncate log files; returns the ones that existed.
    pub fn flush(&self, identifier: Option<&Identifier>) -> Result<Vec<PathBuf>, ManagerError> {
        let mut flushed = Vec::new();
        for path in self.log_targets(identifier)? {
            if logs::truncate(&path)? {
                flushed.push(path);
            }
        }
        Ok(flushed)
    }
}

/// `max(ids) + 1`, or `0` for an empty registry.
pub fn next_id(entries: &[AppEntry]) -> u32 {
    entries
        .iter()
        .map(|e| e.id)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Unit names allow `[A-Za-z0-9:_.-]`; `@` would make a template instance.
fn validate_name(name: &str) -> Result<(), ManagerError> {
    let unit_safe = |c: char| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.' | '-');
    if name.is_empty() || !name.chars().all(unit_safe) {
        return Err(ManagerError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}
