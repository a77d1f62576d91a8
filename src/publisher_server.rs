//! `PublisherServer`: the composition root wiring the watcher, acceptor
//! and subscriber table, and the main `watcher -> serialize -> broadcast`
//! loop.

use crate::acceptor::ConnectionAcceptor;
use crate::hub::{Message, SubscriberTable};
use crate::proto;
use crate::watcher::FileWatcher;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Watcher(#[from] crate::watcher::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("no log files could be watched")]
    NoFilesWatched,
}

pub struct PublisherConfig {
    pub port: u16,
    pub log_root: PathBuf,
    /// Paths relative to `log_root`, from the `ficheros` config file.
    pub files: Vec<String>,
}

pub struct PublisherServer {
    watcher: FileWatcher,
    table: Arc<SubscriberTable>,
    _acceptor: ConnectionAcceptor,
}

impl PublisherServer {
    pub fn new(cfg: PublisherConfig) -> Result<Self> {
        let mut watcher = FileWatcher::initialize(&cfg.log_root)?;

        // Two add passes: a file that isn't readable yet (e.g. created by
        // a process that hasn't finished starting up) gets one retry
        // before we give up on it.
        let mut failed = Vec::new();
        for relative in &cfg.files {
            if let Err(e) = watcher.add(relative) {
                warn!("failed to watch {relative}: {e}");
                failed.push(relative.clone());
            }
        }
        for relative in failed {
            if let Err(e) = watcher.add(&relative) {
                error!("failed to watch {relative} on retry, giving up: {e}");
            } else {
                info!("watching {relative} (recovered on retry)");
            }
        }

        if watcher.watched_count() == 0 {
            return Err(Error::NoFilesWatched);
        }

        let table = Arc::new(SubscriberTable::new());
        let listener = TcpListener::bind(("0.0.0.0", cfg.port))?;
        let acceptor = ConnectionAcceptor::spawn(listener, Arc::downgrade(&table));

        Ok(Self {
            watcher,
            table,
            _acceptor: acceptor,
        })
    }

    /// Runs the main loop until the watcher's kernel event stream fails.
    pub fn run(mut self) {
        loop {
            match self.watcher.next_event() {
                Some(event) => {
                    let wire = proto::encode_event(&event);
                    self.table.send(Arc::new(Message::new(wire)));
                }
                None => {
                    error!("file watcher stream closed, shutting down");
                    self.table.remove_all();
                    return;
                }
            }
        }
    }
}
