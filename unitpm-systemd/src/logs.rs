//! App log files: tail and truncate.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::error::{io_err, SystemdError};

/// Last `lines` lines of `path`. Invalid UTF-8 is replaced, not rejected.
pub fn read_tail(path: &Path, lines: usize) -> Result<Vec<String>, SystemdError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut reader = BufReader::new(file);

    let mut tail = VecDeque::<String>::with_capacity(lines.min(4096));
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(|e| io_err(path, e))?;
        if read == 0 {
            break;
        }
        if lines == 0 {
            continue;
        }
        if tail.len() == lines {
            tail.pop_front();
        }
        let line = String::from_utf8_lossy(&buf);
        tail.push_back(line.trim_end_matches(['\n', '\r']).to_string());
    }
    Ok(tail.into())
}

/// Write a `==> path <==` header followed by the last `lines` lines.
///
/// A missing file prints a notice instead of failing, so one app with no
/// output yet does not hide the other stream.
pub fn print_tail(out: &mut impl Write, path: &Path, lines: usize) -> Result<(), SystemdError> {
    let write_err = |e| io_err(path, e);
    if !path.exists() {
        writeln!(out, "log file not found: {}", path.display()).map_err(write_err)?;
        return Ok(());
    }

    let tail = read_tail(path, lines)?;
    writeln!(out, "==> {} <==", path.display()).map_err(write_err)?;
    for line in tail {
        writeln!(out, "{line}").map_err(write_err)?;
    }
    Ok(())
}

/// Empty `path` in place. Returns `false` when the file does not exist.
///
/// The file is truncated rather than replaced so systemd's open `append:`
/// descriptor keeps writing to it.
pub fn truncate(path: &Path) -> Result<bool, SystemdError> {
    match OpenOptions::new().write(true).truncate(true).open(path) {
        Ok(_) => {
            tracing::debug!(path = %path.display(), "truncated log");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(path, e)),
    }
}
