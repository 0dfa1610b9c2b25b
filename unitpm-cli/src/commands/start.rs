//! `unitpm start`: single script or ecosystem file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use unitpm_core::{ecosystem, AppConfig};

use super::open_manager;

/// Variables copied from the invoking shell into every app started here.
pub const INHERITED_ENV: &[&str] = &["PATH", "HOME", "USER", "NODE_ENV", "PYTHON_ENV", "PORT"];

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Script or command to run, or an ecosystem file (.json, .yaml, .yml).
    pub script: String,

    /// App name. Defaults to the script's file stem.
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Extra environment, repeatable.
    #[arg(long = "env", short = 'e', value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Working directory. Defaults to the current directory.
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Interpreter command, e.g. "python3 -u". Detected from the extension when omitted.
    #[arg(long, short = 'i')]
    pub interpreter: Option<String>,

    /// Numeric id. Assigned automatically when omitted.
    #[arg(long)]
    pub id: Option<u32>,

    /// Arguments passed to the script.
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl StartArgs {
    pub fn run(self) -> Result<()> {
        let script_path = Path::new(&self.script);
        if ecosystem::is_ecosystem_file(script_path) && script_path.is_file() {
            return start_ecosystem(script_path);
        }

        let cwd = match &self.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("failed to read current directory")?,
        };
        let config = self.into_config(&cwd, |key| std::env::var(key).ok())?;

        let (_, manager) = open_manager()?;
        let entry = manager
            .start(&config)
            .with_context(|| format!("failed to start '{}'", config.name))?;
        println!(
            "{} Started {} (id {}, unit {})",
            "✓".green(),
            entry.name,
            entry.id,
            entry.unit
        );
        Ok(())
    }

    /// Build the app record; `lookup` supplies inherited variables.
    pub fn into_config(
        self,
        cwd: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<AppConfig> {
        let mut env = BTreeMap::new();
        for key in INHERITED_ENV {
            if let Some(value) = lookup(*key).filter(|v| !v.is_empty()) {
                env.insert(key.to_string(), value);
            }
        }
        for pair in &self.env {
            let (key, value) = parse_env_pair(pair)?;
            env.insert(key, value);
        }

        let name = match self.name {
            Some(name) => name,
            None => default_name(&self.script)
                .with_context(|| format!("cannot derive an app name from '{}'", self.script))?,
        };

        // A relative script that exists here must stay valid from the unit's WorkingDirectory.
        let candidate = cwd.join(&self.script);
        let script = if Path::new(&self.script).is_relative() && candidate.is_file() {
            candidate.display().to_string()
        } else {
            self.script
        };

        Ok(AppConfig {
            id: self.id.unwrap_or(0),
            name,
            script,
            interpreter: self.interpreter,
            cwd: Some(cwd.to_path_buf()),
            args: self.args.join(" "),
            env,
        })
    }
}

fn start_ecosystem(path: &Path) -> Result<()> {
    let config = ecosystem::load(path)
        .with_context(|| format!("failed to load ecosystem file {}", path.display()))?;
    if config.apps.is_empty() {
        println!("No apps in {}.", path.display());
        return Ok(());
    }

    let (_, manager) = open_manager()?;
    let outcomes = manager.start_ecosystem(&config);
    let total = outcomes.len();
    let mut failed = 0;
    for (name, outcome) in outcomes {
        match outcome {
            Ok(entry) => println!("{} Started {} (id {})", "✓".green(), name, entry.id),
            Err(err) => {
                failed += 1;
                eprintln!("{} {}: {}", "✗".red(), name, err);
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {total} apps failed to start");
    }
    Ok(())
}

/// `KEY=VALUE` with a non-empty key. The value may itself contain `=`.
pub fn parse_env_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("invalid environment variable '{pair}' (expected KEY=VALUE)"),
    }
}

/// `path/to/server.js` → `server`.
pub fn default_name(script: &str) -> Option<String> {
    Path::new(script)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(script: &str) -> StartArgs {
        StartArgs {
            script: script.to_string(),
            name: None,
            env: vec![],
            cwd: None,
            interpreter: None,
            id: None,
            args: vec![],
        }
    }

    #[test]
    fn name_defaults_to_file_stem() {
        assert_eq!(default_name("apps/server.js").as_deref(), Some("server"));
        assert_eq!(default_name("worker").as_deref(), Some("worker"));
        assert_eq!(default_name(""), None);
    }

    #[test]
    fn env_pairs_split_on_first_equals() {
        assert_eq!(
            parse_env_pair("URL=a=b").unwrap(),
            ("URL".to_string(), "a=b".to_string())
        );
        assert!(parse_env_pair("NOEQUALS").is_err());
        assert!(parse_env_pair("=value").is_err());
    }

    #[test]
    fn explicit_env_overrides_inherited() {
        let mut a = args("app.js");
        a.env = vec!["PORT=9000".to_string(), "EXTRA=1".to_string()];
        let cfg = a
            .into_config(Path::new("/srv"), |key| match key {
                "PORT" => Some("3000".to_string()),
                "HOME" => Some("/home/u".to_string()),
                "SECRET" => Some("nope".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(cfg.env["PORT"], "9000");
        assert_eq!(cfg.env["HOME"], "/home/u");
        assert_eq!(cfg.env["EXTRA"], "1");
        assert!(!cfg.env.contains_key("SECRET"));
    }

    #[test]
    fn existing_relative_script_is_made_absolute() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.py"), "print(1)").unwrap();
        let mut a = args("app.py");
        a.args = vec!["--port".to_string(), "80".to_string()];

        let cfg = a.into_config(dir.path(), |_| None).unwrap();
        assert_eq!(cfg.name, "app");
        assert_eq!(cfg.script, dir.path().join("app.py").display().to_string());
        assert_eq!(cfg.args, "--port 80");
        assert_eq!(cfg.cwd.as_deref(), Some(dir.path()));
        assert_eq!(cfg.id, 0);
    }

    #[test]
    fn commands_on_path_are_kept_verbatim() {
        let dir = TempDir::new().unwrap();
        let mut a = args("redis-server");
        a.name = Some("cache".to_string());
        let cfg = a.into_config(dir.path(), |_| None).unwrap();
        assert_eq!(cfg.script, "redis-server");
        assert_eq!(cfg.name, "cache");
    }
}
