//! Tera rendering engine: [`UnitRenderer`] and [`RenderOptions`].
//!
//! # Rendered layout
//!
//! | Section     | Directives                                                   |
//! |-------------|--------------------------------------------------------------|
//! | `[Unit]`    | `Description`, `After=network.target`                        |
//! | `[Service]` | `Type=simple`, `User` (system scope), `WorkingDirectory`,     |
//! |             | `ExecStart`, `Restart=always`, `RestartSec`, `StandardOutput`,|
//! |             | `StandardError`, `X-App*` metadata, `Environment` lines       |
//! | `[Install]` | `WantedBy=default.target`                                    |

use std::path::{Path, PathBuf};

use tera::Tera;

use unitpm_core::types::RESTART_SEC;
use unitpm_core::{AppConfig, UnitDescriptor};

use crate::context::UnitContext;
use crate::error::RenderError;
use crate::exec::ExecResolver;

const SERVICE_TEMPLATE: &str = "unit/service.tera";

const TPLS: &[(&str, &str)] = &[(SERVICE_TEMPLATE, include_str!("templates/service.tera"))];

fn build_tera() -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TPLS.iter().copied())?;
    Ok(tera)
}

/// `{log_dir}/{name}-out.log` and `{log_dir}/{name}-error.log`.
pub fn log_paths(log_dir: &Path, app_name: &str) -> (PathBuf, PathBuf) {
    (
        log_dir.join(format!("{app_name}-out.log")),
        log_dir.join(format!("{app_name}-error.log")),
    )
}

/// Host-dependent inputs to a unit that do not come from the [`AppConfig`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Directory receiving `{name}-out.log` / `{name}-error.log`.
    pub log_dir: PathBuf,
    /// Working directory when the config has none.
    pub default_cwd: PathBuf,
    /// `User=` value; set only for system-scope units.
    pub user: Option<String>,
}

/// Renders [`AppConfig`]s into unit text.
///
/// Create once with [`UnitRenderer::new`] and reuse.
pub struct UnitRenderer {
    tera: Tera,
    resolver: ExecResolver,
}

impl UnitRenderer {
    /// Renderer resolving interpreters on the process `PATH`.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_resolver(ExecResolver::from_env())
    }

    pub fn with_resolver(resolver: ExecResolver) -> Result<Self, RenderError> {
        Ok(UnitRenderer {
            tera: build_tera()?,
            resolver,
        })
    }

    /// Build the unit schema for `config` under `unit_name`.
    pub fn descriptor(
        &self,
        unit_name: &str,
        config: &AppConfig,
        opts: &RenderOptions,
    ) -> UnitDescriptor {
        let (out_log, err_log) = log_paths(&opts.log_dir, &config.name);
        UnitDescriptor {
            unit_name: unit_name.to_string(),
            description: format!("PM2 App: {}", config.name),
            working_dir: Some(
                config
                    .cwd
                    .clone()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| opts.default_cwd.clone()),
            ),
            exec_start: self.resolver.exec_line(config),
            user: opts.user.clone(),
            restart_sec: RESTART_SEC,
            out_log: Some(out_log),
            err_log: Some(err_log),
            env: config.env.clone(),
            script: config.script.clone(),
            interpreter: config
                .interpreter
                .clone()
                .filter(|i| !i.trim().is_empty()),
            args: config.args.clone(),
        }
    }

    /// Render a unit schema to text.
    pub fn render(&self, unit: &UnitDescriptor) -> Result<String, RenderError> {
        let ctx = UnitContext::from_descriptor(unit).to_tera_context()?;
        let text = self.tera.render(SERVICE_TEMPLATE, &ctx)?;
        tracing::debug!(unit = %unit.unit_name, bytes = text.len(), "rendered unit");
        Ok(text)
    }

    /// [`Self::descriptor`] followed by [`Self::render`].
    pub fn render_app(
        &self,
        unit_name: &str,
        config: &AppConfig,
        opts: &RenderOptions,
    ) -> Result<(UnitDescriptor, String), RenderError> {
        let unit = self.descriptor(unit_name, config, opts);
        let text = self.render(&unit)?;
        Ok((unit, text))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
