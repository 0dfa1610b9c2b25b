//! `ExecStart=` command-line synthesis.
//!
//! Precedence:
//! 1. An explicit interpreter: its first word is resolved on `PATH` (kept
//!    literal when unresolved), remaining words are interpreter flags, then
//!    the script and args follow.
//! 2. Otherwise the script extension picks one: `.py` → `python3`,
//!    `.js` → `node` then `nodejs`. Anything else runs verbatim and relies
//!    on its shebang.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use unitpm_core::AppConfig;

/// `PATH` lookup over a fixed list of directories.
#[derive(Debug, Clone, Default)]
pub struct ExecResolver {
    search_path: Vec<PathBuf>,
}

impl ExecResolver {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// Resolver over the current process `PATH`.
    pub fn from_env() -> Self {
        Self::from_path_var(std::env::var_os("PATH"))
    }

    pub fn from_path_var(path: Option<OsString>) -> Self {
        let search_path = path
            .map(|p| std::env::split_paths(&p).filter(|d| !d.as_os_str().is_empty()).collect())
            .unwrap_or_default();
        Self { search_path }
    }

    /// Absolute path of `program`, if an executable file by that name is found.
    ///
    /// Names containing `/` are checked directly instead of searched.
    pub fn lookup(&self, program: &str) -> Option<PathBuf> {
        if program.is_empty() {
            return None;
        }
        if program.contains('/') {
            let candidate = PathBuf::from(program);
            return is_executable(&candidate).then_some(candidate);
        }
        self.search_path
            .iter()
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
    }

    fn resolve_or_literal(&self, program: &str) -> String {
        self.lookup(program)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| program.to_string())
    }

    /// Build the full command line for `config`.
    pub fn exec_line(&self, config: &AppConfig) -> String {
        let mut parts: Vec<String> = Vec::new();

        match config.interpreter.as_deref().map(str::trim) {
            Some(interpreter) if !interpreter.is_empty() => {
                let mut words = interpreter.split_whitespace();
                if let Some(program) = words.next() {
                    parts.push(self.resolve_or_literal(program));
                }
                parts.extend(words.map(str::to_string));
            }
            _ => {
                if let Some(detected) = self.detect_interpreter(&config.script) {
                    parts.push(detected);
                }
            }
        }

        parts.push(config.script.clone());
        if !config.args.trim().is_empty() {
            parts.push(config.args.clone());
        }
        parts.join(" ")
    }

    /// Interpreter implied by the script extension, resolved when possible.
    pub fn detect_interpreter(&self, script: &str) -> Option<String> {
        let ext = Path::new(script).extension().and_then(|s| s.to_str())?;
        match ext {
            "py" => Some(self.resolve_or_literal("python3")),
            "js" => Some(
                self.lookup("node")
                    .or_else(|| self.lookup("nodejs"))
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "node".to_string()),
            ),
            _ => None,
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn bin_dir(programs: &[&str]) -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        for program in programs {
            let path = dir.path().join(program);
            std::fs::write(&path, "#!/bin/sh\n").expect("write");
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                    .expect("chmod");
            }
        }
        dir
    }

    fn config(script: &str, interpreter: Option<&str>, args: &str) -> AppConfig {
        AppConfig {
            interpreter: interpreter.map(str::to_string),
            args: args.to_string(),
            ..AppConfig::new("app", script)
        }
    }

    #[test]
    fn explicit_interpreter_is_resolved_with_flags() {
        let bin = bin_dir(&["node"]);
        let resolver = ExecResolver::new(vec![bin.path().to_path_buf()]);
        let line = resolver.exec_line(&config("app.js", Some("node --max-old-space-size=512"), "--port 80"));
        let node = bin.path().join("node").display().to_string();
        assert_eq!(line, format!("{node} --max-old-space-size=512 app.js --port 80"));
    }

    #[test]
    fn unresolved_interpreter_stays_literal() {
        let resolver = ExecResolver::new(vec![]);
        let line = resolver.exec_line(&config("main.rb", Some("ruby"), ""));
        assert_eq!(line, "ruby main.rb");
    }

    #[rstest]
    #[case("worker.py", &["python3"], "python3")]
    #[case("server.js", &["node"], "node")]
    #[case("server.js", &["nodejs"], "nodejs")]
    fn extension_detection_resolves(#[case] script: &str, #[case] installed: &[&str], #[case] program: &str) {
        let bin = bin_dir(installed);
        let resolver = ExecResolver::new(vec![bin.path().to_path_buf()]);
        let expected = format!("{} {script}", bin.path().join(program).display());
        assert_eq!(resolver.exec_line(&config(script, None, "")), expected);
    }

    #[rstest]
    #[case("worker.py", "python3 worker.py")]
    #[case("server.js", "node server.js")]
    #[case("./run.sh", "./run.sh")]
    #[case("/usr/local/bin/daemon", "/usr/local/bin/daemon")]
    fn extension_detection_fallbacks(#[case] script: &str, #[case] expected: &str) {
        let resolver = ExecResolver::new(vec![]);
        assert_eq!(resolver.exec_line(&config(script, None, "")), expected);
    }

    #[test]
    fn args_follow_autodetected_script() {
        let resolver = ExecResolver::new(vec![]);
        assert_eq!(
            resolver.exec_line(&config("tool.py", None, "-v --once")),
            "python3 tool.py -v --once"
        );
    }

    #[test]
    fn blank_interpreter_falls_back_to_detection() {
        let resolver = ExecResolver::new(vec![]);
        assert_eq!(resolver.exec_line(&config("x.py", Some("  "), "")), "python3 x.py");
    }

    #[test]
    fn path_var_skips_empty_entries() {
        let resolver = ExecResolver::from_path_var(Some(OsString::from("/usr/bin::/bin")));
        assert_eq!(resolver.search_path.len(), 2);
    }

    #[test]
    fn non_executable_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("python3"), "").unwrap();
        let resolver = ExecResolver::new(vec![dir.path().to_path_buf()]);
        #[cfg(unix)]
        assert!(resolver.lookup("python3").is_none());
    }
}
