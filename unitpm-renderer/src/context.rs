//! Template context: serializable rendering payload built from a [`UnitDescriptor`].

use serde::{Deserialize, Serialize};

use unitpm_core::UnitDescriptor;

use crate::error::RenderError;

/// Install target every unit is wanted by.
pub const WANTED_BY: &str = "default.target";

/// Flat rendering payload for `service.tera`.
///
/// Every value is single-line; line breaks in caller input would split a
/// directive and are flattened to spaces. `%` and `$` in `ExecStart=` are
/// doubled so systemd passes them through literally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitContext {
    pub description: String,
    pub user: Option<String>,
    pub working_dir: Option<String>,
    pub exec_start: String,
    pub restart_sec: u32,
    pub out_log: Option<String>,
    pub err_log: Option<String>,
    pub script: String,
    pub interpreter: String,
    pub args: String,
    /// Pre-formatted `Environment=` lines, sorted by key.
    pub environment: Vec<String>,
    pub wanted_by: String,
}

impl UnitContext {
    pub fn from_descriptor(unit: &UnitDescriptor) -> Self {
        UnitContext {
            description: single_line(&unit.description),
            user: unit.user.as_deref().map(single_line),
            working_dir: unit
                .working_dir
                .as_ref()
                .map(|p| single_line(&p.display().to_string())),
            exec_start: escape_exec(&unit.exec_start),
            restart_sec: unit.restart_sec,
            out_log: unit.out_log.as_ref().map(|p| single_line(&p.display().to_string())),
            err_log: unit.err_log.as_ref().map(|p| single_line(&p.display().to_string())),
            script: single_line(&unit.script),
            interpreter: single_line(unit.interpreter.as_deref().unwrap_or("")),
            args: single_line(&unit.args),
            environment: unit
                .env
                .iter()
                .map(|(key, value)| environment_line(key, value))
                .collect(),
            wanted_by: WANTED_BY.to_string(),
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

fn escape_exec(exec: &str) -> String {
    single_line(exec).replace('%', "%%").replace('$', "$$")
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// One `Environment=` directive.
///
/// Values with whitespace, either quote character or backslashes are
/// double-quoted with C-style escapes; `%` is doubled so systemd does not
/// expand specifiers.
pub fn environment_line(key: &str, value: &str) -> String {
    let assignment = format!("{}={}", single_line(key), single_line(value).replace('%', "%%"));
    let needs_quotes = assignment
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\'));
    if !needs_quotes {
        return format!("Environment={assignment}");
    }
    let escaped = assignment.replace('\\', "\\\\").replace('"', "\\\"");
    format!("Environment=\"{escaped}\"")
}
