//! Structured decoder for unit files written by [`crate::UnitRenderer`].
//!
//! Never fails: unknown directives are skipped and missing ones leave the
//! field empty, so one corrupt unit cannot break a listing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use unitpm_core::{ServiceConfig, UnitDescriptor};

const KEY_SCRIPT: &str = "X-AppScript";
const KEY_INTERPRETER: &str = "X-AppInterpreter";
const KEY_ARGS: &str = "X-AppArgs";

/// Decode unit text into the fixed [`UnitDescriptor`] schema.
///
/// When the `X-App*` metadata keys are absent (units from older releases),
/// script/interpreter/args are recovered from `ExecStart=`: first word is the
/// interpreter, second the script, the rest the args.
pub fn parse(unit_name: &str, text: &str) -> UnitDescriptor {
    let mut unit = UnitDescriptor {
        unit_name: unit_name.to_string(),
        ..UnitDescriptor::default()
    };
    let mut script: Option<String> = None;
    let mut interpreter: Option<String> = None;
    let mut args: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim_start().trim_end_matches('\r');
        if line.is_empty() || line.starts_with(['#', ';', '[']) {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        match key {
            KEY_SCRIPT => script = Some(value.to_string()),
            KEY_INTERPRETER => interpreter = Some(value.to_string()),
            KEY_ARGS => args = Some(value.to_string()),
            _ => apply_directive(&mut unit, key, value.trim()),
        }
    }

    if script.is_none() || interpreter.is_none() || args.is_none() {
        let (exec_interpreter, exec_script, exec_args) = split_exec(&unit.exec_start);
        script.get_or_insert(exec_script);
        interpreter.get_or_insert(exec_interpreter);
        args.get_or_insert(exec_args);
    }

    unit.script = script.unwrap_or_default();
    unit.interpreter = interpreter.filter(|i| !i.is_empty());
    unit.args = args.unwrap_or_default();
    unit
}

/// [`parse`] flattened into a [`ServiceConfig`].
pub fn parse_service_config(unit_name: &str, text: &str) -> ServiceConfig {
    parse(unit_name, text).service_config()
}

fn apply_directive(unit: &mut UnitDescriptor, key: &str, value: &str) {
    match key {
        "Description" => unit.description = value.to_string(),
        "User" => unit.user = Some(value.to_string()).filter(|u| !u.is_empty()),
        "WorkingDirectory" => {
            unit.working_dir = Some(PathBuf::from(value)).filter(|p| !p.as_os_str().is_empty())
        }
        "ExecStart" => unit.exec_start = value.replace("%%", "%").replace("$$", "$"),
        "RestartSec" => unit.restart_sec = value.parse().unwrap_or(0),
        "StandardOutput" => unit.out_log = output_path(value),
        "StandardError" => unit.err_log = output_path(value),
        "Environment" => unit.env.extend(parse_environment(value)),
        _ => {}
    }
}

/// `append:/path` or `file:/path` → `/path`; other output modes carry no file.
fn output_path(value: &str) -> Option<PathBuf> {
    value
        .strip_prefix("append:")
        .or_else(|| value.strip_prefix("file:"))
        .or_else(|| value.strip_prefix("truncate:"))
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn split_exec(exec: &str) -> (String, String, String) {
    let mut words = exec.split_whitespace();
    let interpreter = words.next().unwrap_or("").to_string();
    let script = words.next().unwrap_or("").to_string();
    let args = words.collect::<Vec<_>>().join(" ");
    (interpreter, script, args)
}

/// Split one `Environment=` value into assignments.
///
/// Words are whitespace separated; a double-quoted word may contain
/// whitespace and `\"`/`\\` escapes, a single-quoted word is taken
/// literally. `%%` collapses to `%`.
pub fn parse_environment(value: &str) -> BTreeMap<String, String> {
    let mut assignments = BTreeMap::new();
    let mut chars = value.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };

        let mut word = String::new();
        if first == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            word.push(escaped);
                        }
                    }
                    other => word.push(other),
                }
            }
        } else if first == '\'' {
            chars.next();
            word.extend(chars.by_ref().take_while(|&c| c != '\''));
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                word.push(c);
            }
        }

        if let Some((key, val)) = word.split_once('=') {
            if !key.is_empty() {
                assignments.insert(key.to_string(), val.replace("%%", "%"));
            }
        }
    }
    assignments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_unit_falls_back_to_exec_split() {
        let text = "[Service]\nExecStart=/usr/bin/python3 app.py --port 80 -v\n";
        let unit = parse("pm2-api", text);
        assert_eq!(unit.interpreter.as_deref(), Some("/usr/bin/python3"));
        assert_eq!(unit.script, "app.py");
        assert_eq!(unit.args, "--port 80 -v");
    }

    #[test]
    fn garbage_degrades_to_empty_fields() {
        let unit = parse("pm2-0-x", "\u{0}\u{1}not a unit\n===\nExecStart\n");
        assert_eq!(unit.unit_name, "pm2-0-x");
        assert!(unit.script.is_empty());
        assert!(unit.interpreter.is_none());
        assert!(unit.out_log.is_none());
        assert!(unit.env.is_empty());
    }

    #[test]
    fn multiple_assignments_on_one_line() {
        let env = parse_environment(r#"A=1 "B=two words" C=x\y "D=q\"uote""#);
        assert_eq!(env["A"], "1");
        assert_eq!(env["B"], "two words");
        assert_eq!(env["C"], r"x\y");
        assert_eq!(env["D"], "q\"uote");
    }

    #[test]
    fn single_quoted_words_are_literal() {
        let env = parse_environment(r#"'A=x y' "B=it's" C=1"#);
        assert_eq!(env["A"], "x y");
        assert_eq!(env["B"], "it's");
        assert_eq!(env["C"], "1");
    }

    #[test]
    fn percent_escape_collapses() {
        assert_eq!(parse_environment("P=100%%")["P"], "100%");
    }

    #[test]
    fn words_without_assignment_are_skipped() {
        let env = parse_environment("junk =nokey OK=1");
        assert_eq!(env.len(), 1);
        assert_eq!(env["OK"], "1");
    }

    #[test]
    fn only_file_output_modes_yield_paths() {
        let text = "StandardOutput=journal\nStandardError=file:/var/log/e.log\n";
        let unit = parse("pm2-0-x", text);
        assert!(unit.out_log.is_none());
        assert_eq!(unit.err_log, Some(PathBuf::from("/var/log/e.log")));
    }

    #[test]
    fn pid_path_is_always_synthesised() {
        let cfg = parse_service_config("pm2-4-web", "");
        assert_eq!(cfg.pid_path, PathBuf::from("/tmp/pm2-4-web.pid"));
    }
}
