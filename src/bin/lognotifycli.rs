//! Subscriber: connects to one or more publishers, filters incoming
//! events against a rule file, displays them, and journals them.

use bpaf::Bpaf;
use lognotify::notification_center::{NotificationCenter, NotificationOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Opts {
    /// Fork into the background
    #[bpaf(short('d'), long("daemonize"))]
    daemonize: bool,
    /// Configuration directory holding `servidores`, `filtro`, `historial`
    #[bpaf(short('f'), long("config-dir"), fallback(lognotify::config::default_config_dir()))]
    config_dir: PathBuf,
    /// Display timeout in milliseconds (backend default if unset)
    #[bpaf(short('t'), long("timeout-ms"))]
    timeout_ms: Option<u32>,
    /// Number of old sessions to retain in the history file
    #[bpaf(short('s'), long("history-retention"), fallback(5u32))]
    history_retention: u32,
    /// Show the full path of the watched file instead of just its name
    #[bpaf(short('r'), long("full-path"))]
    full_path: bool,
    /// Append the sender's address/port to the notification body
    #[bpaf(short('o'), long("append-sender"))]
    append_sender: bool,
}

#[cfg(feature = "desktop-notifications")]
fn build_display() -> lognotify::desktop_display::DesktopDisplay {
    lognotify::desktop_display::DesktopDisplay {
        app_name: "lognotify".to_string(),
    }
}

#[cfg(not(feature = "desktop-notifications"))]
fn build_display() -> lognotify::notification_center::LoggingDisplay {
    lognotify::notification_center::LoggingDisplay
}

fn main() -> ExitCode {
    let opts = opts().run();

    if opts.daemonize {
        if let Err(e) = lognotify::daemon::daemonize() {
            eprintln!("failed to daemonize: {e}");
            return ExitCode::from(255);
        }
    }

    #[cfg(feature = "tracing-journald")]
    lognotify::logging::init(opts.daemonize);
    #[cfg(not(feature = "tracing-journald"))]
    lognotify::logging::init();

    let filter_path = opts.config_dir.join("filtro");
    let filter = match lognotify::filter::dsl::load(&filter_path) {
        Ok(filter) => filter,
        Err(e) => {
            error!("no usable filter at {}, admitting everything: {e}", filter_path.display());
            lognotify::filter::Filter::default()
        }
    };

    let history_path = opts.config_dir.join("historial");
    let history = match lognotify::history::History::open(history_path.clone(), opts.history_retention) {
        Ok(history) => Some(history),
        Err(e) => {
            error!("failed to open history at {}, continuing without it: {e}", history_path.display());
            None
        }
    };

    let options = NotificationOptions {
        app_icon: String::new(),
        timeout_ms: opts.timeout_ms,
        show_full_path: opts.full_path,
        append_sender: opts.append_sender,
    };
    let center = Arc::new(NotificationCenter::new(filter, history, build_display(), options));

    let servers_path = opts.config_dir.join("servidores");
    match lognotify::client::run(&servers_path, center) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(255)
        }
    }
}
