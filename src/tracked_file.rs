//! A single watched file's last observed size, and the logic that turns a
//! size delta into the text appended since the previous poll.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// One file being watched: its name and directory relative to the log
/// root, and the byte offset we've already delivered.
#[derive(Debug, Clone)]
pub struct TrackedFile {
    pub name: String,
    /// Directory portion relative to the log root, including a trailing
    /// slash (or empty for files directly in the root).
    pub location: String,
    last_size: u64,
}

impl TrackedFile {
    pub fn new(name: impl Into<String>, location: impl Into<String>, initial_size: u64) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            last_size: initial_size,
        }
    }

    /// Path relative to the log root (`location` + `name`).
    pub fn relative_path(&self) -> String {
        format!("{}{}", self.location, self.name)
    }

    /// Reads `full_path` and returns newly appended content, if any.
    ///
    /// A shrink (current size at or below `last_size`) never emits and
    /// resets `last_size` to the new, smaller size — this one policy
    /// covers truncation, logrotate's `truncate` mode and same-inode
    /// recreate races.
    pub fn poll_append(&mut self, full_path: &Path) -> std::io::Result<Option<String>> {
        let mut file = File::open(full_path)?;
        let current_end = file.seek(SeekFrom::End(0))?;
        if current_end <= self.last_size {
            self.last_size = current_end;
            return Ok(None);
        }
        file.seek(SeekFrom::Start(self.last_size))?;
        let mut raw = Vec::with_capacity((current_end - self.last_size) as usize);
        file.take(current_end - self.last_size).read_to_end(&mut raw)?;
        self.last_size = current_end;

        // Join lines the way a `getline` loop would: this drops exactly
        // one trailing newline, if present, and nothing else.
        if raw.last() == Some(&b'\n') {
            raw.pop();
        }
        let description = String::from_utf8_lossy(&raw).into_owned();
        if description.is_empty() {
            return Ok(None);
        }
        Ok(Some(description))
    }

    pub fn last_size(&self) -> u64 {
        self.last_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn single_append_emits_stripped_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, b"").unwrap();
        let mut tf = TrackedFile::new("a.log", "", 0);

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"hello\n").unwrap();
        drop(f);

        let desc = tf.poll_append(&path).unwrap();
        assert_eq!(desc.as_deref(), Some("hello"));
    }

    #[test]
    fn multiline_append_joins_with_newlines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, b"x\n").unwrap();
        let mut tf = TrackedFile::new("a.log", "", 2);

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"y\nz\n").unwrap();
        drop(f);

        let desc = tf.poll_append(&path).unwrap();
        assert_eq!(desc.as_deref(), Some("y\nz"));
    }

    #[test]
    fn truncate_then_write_resets_without_emitting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, vec![b'x'; 100]).unwrap();
        let mut tf = TrackedFile::new("a.log", "", 100);

        std::fs::write(&path, b"").unwrap();
        let desc = tf.poll_append(&path).unwrap();
        assert_eq!(desc, None);
        assert_eq!(tf.last_size(), 0);

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"new").unwrap();
        drop(f);

        let desc = tf.poll_append(&path).unwrap();
        assert_eq!(desc.as_deref(), Some("new"));
    }

    #[test]
    fn blank_line_append_yields_no_event() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.log");
        std::fs::write(&path, b"").unwrap();
        let mut tf = TrackedFile::new("a.log", "", 0);

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"\n").unwrap();
        drop(f);

        let desc = tf.poll_append(&path).unwrap();
        assert_eq!(desc, None);
    }
}
