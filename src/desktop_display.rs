//! The default [`crate::notification_center::Display`] backend, built on
//! `notify-rust`. Gated behind the `desktop-notifications` feature so a
//! headless build can fall back to `LoggingDisplay` instead.

#![cfg(feature = "desktop-notifications")]

use crate::notification_center::{Display, Error, Result};
use notify_rust::Notification;

pub struct DesktopDisplay {
    pub app_name: String,
}

impl Display for DesktopDisplay {
    fn show(&self, header: &str, body: &str, icon: &str, timeout_ms: Option<u32>) -> Result<()> {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(header)
            .body(body);
        if !icon.is_empty() {
            notification.icon(icon);
        }
        if let Some(ms) = timeout_ms {
            notification.timeout(ms as i32);
        }
        notification
            .show()
            .map(|_| ())
            .map_err(|e| Error::Display(e.to_string()))
    }
}
