//! Publisher: watches a set of log files and broadcasts newly appended
//! content to connected subscribers over TCP.

use bpaf::Bpaf;
use lognotify::publisher_server::{PublisherConfig, PublisherServer};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Opts {
    /// TCP port to listen on (1..=65535)
    #[bpaf(short('p'), long("port"), guard(port_is_valid, "port must be in 1..=65535"))]
    port: u16,
    /// Configuration directory holding the `ficheros` file
    #[bpaf(short('f'), long("config-dir"), fallback(lognotify::config::default_config_dir()))]
    config_dir: PathBuf,
    /// Root directory log paths in `ficheros` are relative to
    #[bpaf(short('w'), long("log-root"), fallback(PathBuf::from("/var/log")))]
    log_root: PathBuf,
    /// Fork into the background
    #[bpaf(short('d'), long("daemonize"))]
    daemonize: bool,
}

/// Rejects port 0: binding it would hand the publisher an OS-assigned
/// ephemeral port instead of the one the operator asked for.
fn port_is_valid(port: &u16) -> bool {
    *port != 0
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

    let files_path = opts.config_dir.join("ficheros");
    let files = match lognotify::config::read_file_list(&files_path) {
        Ok(files) if !files.is_empty() => files,
        Ok(_) => {
            error!("no log files configured in {}", files_path.display());
            return ExitCode::from(255);
        }
        Err(e) => {
            error!("failed to read {}: {e}", files_path.display());
            return ExitCode::from(255);
        }
    };

    let server = match PublisherServer::new(PublisherConfig {
        port: opts.port,
        log_root: opts.log_root,
        files,
    }) {
        Ok(server) => server,
        Err(e) => {
            error!("failed to start publisher: {e}");
            return ExitCode::from(255);
        }
    };

    server.run();
    ExitCode::SUCCESS
}
