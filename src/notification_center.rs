//! `NotificationCenter`: the single synchronization point through which
//! events are filtered, displayed, and journaled.

use crate::event::SubscriberEvent;
use crate::filter::Filter;
use crate::history::History;
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Display(String),
}

/// An opaque desktop-notification capability. `desktop_notify` provides
/// the default backend; tests and headless hosts can substitute any
/// other implementation.
pub trait Display: Send + Sync {
    fn show(
        &self,
        header: &str,
        body: &str,
        icon: &str,
        timeout_ms: Option<u32>,
    ) -> Result<()>;
}

/// Falls back to logging the would-be notification at `info`, so the
/// subscriber remains useful without a desktop session.
pub struct LoggingDisplay;

impl Display for LoggingDisplay {
    fn show(&self, header: &str, body: &str, _icon: &str, _timeout_ms: Option<u32>) -> Result<()> {
        tracing::info!("notification: {header} — {body}");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NotificationOptions {
    pub app_icon: String,
    pub timeout_ms: Option<u32>,
    pub show_full_path: bool,
    pub append_sender: bool,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            app_icon: String::new(),
            timeout_ms: None,
            show_full_path: false,
            append_sender: false,
        }
    }
}

pub struct NotificationCenter<D: Display> {
    filter: Filter,
    history: Mutex<Option<History>>,
    display_mutex: Mutex<()>,
    display: D,
    options: NotificationOptions,
}

impl<D: Display> NotificationCenter<D> {
    pub fn new(
        filter: Filter,
        history: Option<History>,
        display: D,
        options: NotificationOptions,
    ) -> Self {
        Self {
            filter,
            history: Mutex::new(history),
            display_mutex: Mutex::new(()),
            display,
            options,
        }
    }

    /// Filters, displays and journals `event`, with the dual-mutex
    /// handoff that guarantees history writes appear in the same order
    /// events entered this function.
    ///
    /// The history mutex is acquired while the display mutex is still
    /// held, and only then is the display mutex released — dropping the
    /// display guard before acquiring the history guard would lose the
    /// cross-event ordering invariant this method exists to provide.
    pub fn notify(&self, event: SubscriberEvent) {
        let header = if self.options.show_full_path {
            format!("{}{}", event.location, event.name)
        } else {
            event.name.clone()
        };
        let mut body = event.description.clone();
        if self.options.append_sender {
            body = format!("{}\nFrom: {}/{}", body, event.sender_address, event.sender_port);
        }

        let display_guard = self.display_mutex.lock().unwrap();
        if self.filter.admits(&event) {
            if let Err(e) = self
                .display
                .show(&header, &body, &self.options.app_icon, self.options.timeout_ms)
            {
                warn!("display backend failed: {e}");
            }
        }
        let history_guard = self.history.lock().unwrap();
        drop(display_guard);

        if let Some(history) = history_guard.as_ref() {
            if let Err(e) = history.append(&event) {
                warn!("failed to write history: {e}");
            }
        }
        drop(history_guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};
    use tempfile::tempdir;

    struct RecordingDisplay {
        calls: Arc<StdMutex<Vec<String>>>,
    }

    impl Display for RecordingDisplay {
        fn show(&self, header: &str, body: &str, _icon: &str, _timeout_ms: Option<u32>) -> Result<()> {
            self.calls.lock().unwrap().push(format!("{header}: {body}"));
            Ok(())
        }
    }

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
    fn suppressed_events_still_reach_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("historial");
        let history = History::open(path.clone(), 5).unwrap();
        let filter = crate::filter::dsl::parse("regla\ncontenido=.*secret.*\n");
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let display = RecordingDisplay { calls: calls.clone() };
        let center = NotificationCenter::new(
            filter,
            Some(history),
            display,
            NotificationOptions::default(),
        );

        center.notify(event("a leaked secret here"));

        assert!(calls.lock().unwrap().is_empty(), "suppressed event must not display");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("a leaked secret here"), "suppressed event must still be journaled");
    }

    #[test]
    fn admitted_events_display_and_journal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("historial");
        let history = History::open(path.clone(), 5).unwrap();
        let filter = crate::filter::Filter::default();
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let display = RecordingDisplay { calls: calls.clone() };
        let center = NotificationCenter::new(
            filter,
            Some(history),
            display,
            NotificationOptions::default(),
        );

        center.notify(event("all clear"));

        assert_eq!(calls.lock().unwrap().len(), 1);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("all clear"));
    }
}
