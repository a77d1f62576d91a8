//! Turns kernel `inotify` events into a stream of append events, surviving
//! the rename-then-recreate log rotation pattern.

use crate::event::PublisherEvent;
use crate::tracked_file::TrackedFile;
use inotify::{EventMask, Inotify, WatchDescriptor, WatchMask};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("log root does not exist or is not a directory: {0}")]
    InvalidRoot(PathBuf),
    #[error("path escapes the log root: {0}")]
    EscapesRoot(String),
    #[error("not a regular file: {0}")]
    NotARegularFile(PathBuf),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Watches a set of regular files inside a single canonical root directory.
pub struct FileWatcher {
    inotify: Inotify,
    root: PathBuf,
    /// file watch handle -> the file it tracks
    watched: HashMap<WatchDescriptor, TrackedFile>,
    /// directory watch handle -> files awaiting reappearance in it
    pending: HashMap<WatchDescriptor, Vec<TrackedFile>>,
    /// canonical directory path -> its watch handle, so we don't double-add
    dir_watches: HashMap<PathBuf, WatchDescriptor>,
    read_buffer: [u8; 4096],
}

impl FileWatcher {
    /// Resolves `log_directory` to a canonical absolute path and opens the
    /// underlying kernel notification facility.
    pub fn initialize(log_directory: impl AsRef<Path>) -> Result<Self> {
        let root = std::fs::canonicalize(log_directory.as_ref())
            .map_err(|_| Error::InvalidRoot(log_directory.as_ref().to_path_buf()))?;
        if !root.is_dir() {
            return Err(Error::InvalidRoot(root));
        }
        let inotify = Inotify::init()?;
        Ok(Self {
            inotify,
            root,
            watched: HashMap::new(),
            pending: HashMap::new(),
            dir_watches: HashMap::new(),
            read_buffer: [0; 4096],
        })
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len() + self.pending.values().map(|v| v.len()).sum::<usize>()
    }

    /// Resolves `relative` inside the canonical root, confirms it's a
    /// regular file, records its current size and attaches a watch for
    /// MODIFY, DELETE_SELF and MOVE_SELF.
    pub fn add(&mut self, relative: &str) -> Result<()> {
        let full = self.resolve_strict(relative)?;
        let meta = std::fs::metadata(&full)?;
        if !meta.is_file() {
            return Err(Error::NotARegularFile(full));
        }
        let wd = self.inotify.watches().add(
            &full,
            WatchMask::MODIFY | WatchMask::DELETE_SELF | WatchMask::MOVE_SELF,
        )?;
        let (location, name) = split_relative(relative);
        self.watched
            .insert(wd, TrackedFile::new(name, location, meta.len()));
        Ok(())
    }

    /// Detaches the watch on `relative`, if any (watched or pending).
    pub fn remove(&mut self, relative: &str) {
        if let Some(wd) = self
            .watched
            .iter()
            .find(|(_, tf)| tf.relative_path() == relative)
            .map(|(wd, _)| wd.clone())
        {
            let _ = self.inotify.watches().remove(wd.clone());
            self.watched.remove(&wd);
            return;
        }
        for files in self.pending.values_mut() {
            files.retain(|tf| tf.relative_path() != relative);
        }
    }

    /// Detaches every watch: file and directory alike.
    pub fn remove_all(&mut self) {
        for wd in self.watched.keys().cloned().collect::<Vec<_>>() {
            let _ = self.inotify.watches().remove(wd);
        }
        self.watched.clear();
        for wd in self.dir_watches.values().cloned().collect::<Vec<_>>() {
            let _ = self.inotify.watches().remove(wd);
        }
        self.dir_watches.clear();
        self.pending.clear();
    }

    /// Blocks until the next append event, or returns `None` if the
    /// underlying kernel event stream is no longer usable.
    pub fn next_event(&mut self) -> Option<PublisherEvent> {
        loop {
            let events = match self.inotify.read_events_blocking(&mut self.read_buffer) {
                Ok(events) => events.map(|e| e.into_owned()).collect::<Vec<_>>(),
                Err(e) => {
                    warn!("inotify read failed, watcher stream closing: {e}");
                    return None;
                }
            };
            for event in events {
                if let Some(emitted) = self.process(event) {
                    return Some(emitted);
                }
            }
        }
    }

    fn process(
        &mut self,
        event: inotify::Event<OsString>,
    ) -> Option<PublisherEvent> {
        if event.mask.contains(EventMask::MODIFY) {
            return self.handle_modify(&event.wd);
        }
        if event.mask.contains(EventMask::DELETE_SELF) || event.mask.contains(EventMask::MOVE_SELF)
        {
            self.handle_rotation_start(&event.wd);
            return None;
        }
        if event.mask.contains(EventMask::CREATE) || event.mask.contains(EventMask::MOVED_TO) {
            if let Some(name) = event.name {
                self.handle_rotation_finish(&event.wd, &name.to_string_lossy());
            }
        }
        None
    }

    fn handle_modify(&mut self, wd: &WatchDescriptor) -> Option<PublisherEvent> {
        let tf = self.watched.get_mut(wd)?;
        let full = self.root.join(tf.relative_path());
        match tf.poll_append(&full) {
            Ok(Some(description)) => Some(PublisherEvent::new(
                tf.name.clone(),
                self.root.join(&tf.location).to_string_lossy().into_owned(),
                description,
            )),
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read append on {}: {e}", tf.relative_path());
                None
            }
        }
    }

    fn handle_rotation_start(&mut self, wd: &WatchDescriptor) {
        let Some(tf) = self.watched.remove(wd) else {
            return;
        };
        let _ = self.inotify.watches().remove(wd.clone());
        let dir = self.root.join(&tf.location);
        let dir_wd = if let Some(existing) = self.dir_watches.get(&dir) {
            existing.clone()
        } else {
            match self
                .inotify
                .watches()
                .add(&dir, WatchMask::CREATE | WatchMask::MOVED_TO)
            {
                Ok(new_wd) => {
                    self.dir_watches.insert(dir.clone(), new_wd.clone());
                    new_wd
                }
                Err(e) => {
                    warn!("failed to watch {} for rotation: {e}", dir.display());
                    return;
                }
            }
        };
        info!("{} rotated away, awaiting reappearance", tf.relative_path());
        self.pending.entry(dir_wd).or_default().push(tf);
    }

    fn handle_rotation_finish(&mut self, dir_wd: &WatchDescriptor, name: &str) {
        let Some(files) = self.pending.get_mut(dir_wd) else {
            return;
        };
        let Some(pos) = files.iter().position(|tf| tf.name == name) else {
            return;
        };
        let tf = files.remove(pos);
        let relative = tf.relative_path();
        if files.is_empty() {
            self.pending.remove(dir_wd);
            let _ = self.inotify.watches().remove(dir_wd.clone());
            self.dir_watches.retain(|_, wd| *wd != *dir_wd);
        }
        if let Err(e) = self.add(&relative) {
            warn!("failed to re-attach {relative} after rotation: {e}");
        } else {
            info!("{relative} reappeared, watching again");
        }
    }

    fn resolve_strict(&self, relative: &str) -> Result<PathBuf> {
        let joined = self.root.join(relative);
        let canonical = std::fs::canonicalize(&joined)
            .map_err(|_| Error::EscapesRoot(relative.to_string()))?;
        if !canonical.starts_with(&self.root) {
            return Err(Error::EscapesRoot(relative.to_string()));
        }
        Ok(canonical)
    }
}

/// Splits `relative` into a directory portion (empty, or ending in `/`)
/// and a basename, matching the original implementation's convention.
fn split_relative(relative: &str) -> (String, String) {
    match relative.rfind('/') {
        Some(idx) => (relative[..=idx].to_string(), relative[idx + 1..].to_string()),
        None => (String::new(), relative.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_relative_handles_nested_paths() {
        assert_eq!(split_relative("a.log"), ("".to_string(), "a.log".to_string()));
        assert_eq!(
            split_relative("sub/dir/a.log"),
            ("sub/dir/".to_string(), "a.log".to_string())
        );
    }

    #[test]
    fn initialize_rejects_missing_directory() {
        let err = FileWatcher::initialize("/nonexistent/definitely/not/here");
        assert!(err.is_err());
    }

    #[test]
    fn initialize_rejects_a_file_as_root() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let err = FileWatcher::initialize(tmp.path());
        assert!(matches!(err, Err(Error::InvalidRoot(_))));
    }
}
