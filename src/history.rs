//! Append-only session log with generational rotation of old sessions.

use crate::event::SubscriberEvent;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub struct History {
    path: PathBuf,
}

impl History {
    /// Rotates any existing session files at `path` and truncate-creates
    /// a fresh one for the new session.
    ///
    /// With `max_old_sessions == 0` rotation is skipped outright rather
    /// than renaming `path` to an un-collected `path.1` — see DESIGN.md.
    pub fn open(path: PathBuf, max_old_sessions: u32) -> Result<Self> {
        if max_old_sessions > 0 {
            rotate(&path, max_old_sessions);
        }
        OpenOptions::new().create(true).write(true).truncate(true).open(&path)?;
        Ok(Self { path })
    }

    /// Appends one event record. Time is local time at the moment of write.
    pub fn append(&self, event: &SubscriberEvent) -> Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let now = chrono::Local::now();
        writeln!(
            file,
            "{}\t{}/{}\t{}{}",
            now.format("%Y-%m-%d %H:%M:%S"),
            event.sender_address,
            event.sender_port,
            event.location,
            event.name,
        )?;
        writeln!(file, "{}", event.description)?;
        writeln!(file)?;
        Ok(())
    }
}

fn rotate(path: &Path, n: u32) {
    let last = with_suffix(path, n);
    let _ = std::fs::remove_file(&last);
    for i in (1..n).rev() {
        let src = with_suffix(path, i);
        if src.exists() {
            let _ = std::fs::rename(&src, with_suffix(path, i + 1));
        }
    }
    if path.exists() {
        let _ = std::fs::rename(path, with_suffix(path, 1));
    }
}

fn with_suffix(path: &Path, n: u32) -> PathBuf {
    let mut name: OsString = path.file_name().unwrap_or_default().to_owned();
    name.push(format!(".{n}"));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn event(description: &str) -> SubscriberEvent {
        SubscriberEvent {
            name: "a.log".to_string(),
            location: "/var/log/".to_string(),
            description: description.to_string(),
            sender_address: "10.0.0.1".to_string(),
            sender_port: "9000".to_string(),
        }
    }

    #[test]
    fn append_writes_a_three_line_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("historial");
        let history = History::open(path.clone(), 5).unwrap();
        history.append(&event("hello")).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("10.0.0.1/9000"));
        assert!(lines[0].contains("/var/log/a.log"));
        assert_eq!(lines[1], "hello");
        assert_eq!(lines[2], "");
    }

    #[test]
    fn rotation_keeps_exactly_n_old_sessions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("historial");
        for _ in 0..4 {
            let history = History::open(path.clone(), 2).unwrap();
            history.append(&event("session")).unwrap();
        }
        assert!(path.exists());
        assert!(path.with_file_name("historial.1").exists());
        assert!(path.with_file_name("historial.2").exists());
        assert!(!path.with_file_name("historial.3").exists());
    }

    #[test]
    fn zero_retention_never_leaves_a_stray_dot_one() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("historial");
        for _ in 0..3 {
            let history = History::open(path.clone(), 0).unwrap();
            history.append(&event("session")).unwrap();
        }
        assert!(path.exists());
        assert!(!path.with_file_name("historial.1").exists());
    }
}
