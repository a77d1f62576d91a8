//! `Client`: subscriber-side composition root. Reads the server list,
//! spawns one [`Server`] per line, and blocks until all connections close.

use crate::notification_center::Display;
use crate::notification_center::NotificationCenter;
use crate::server::Server;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Config(#[from] crate::config::Error),
    #[error("no publishers could be reached")]
    NoServers,
}

/// Reads `servers_path`, connects to each listed publisher, and blocks
/// until every connection has closed. Returns once at least one attempt
/// was made; fails only if the server list is empty or none connected.
pub fn run<D: Display + 'static>(
    servers_path: &Path,
    center: Arc<NotificationCenter<D>>,
) -> Result<()> {
    let entries = crate::config::read_server_list(servers_path)?;
    if entries.is_empty() {
        return Err(Error::NoServers);
    }

    let servers: Vec<Arc<Server>> = entries
        .into_iter()
        .map(|(addr, port)| Server::new(addr, port))
        .collect();

    let mut connected_any = false;
    for server in &servers {
        match server.connect(center.clone()) {
            Ok(()) => connected_any = true,
            Err(e) => warn!("{e}"),
        }
    }
    if !connected_any {
        return Err(Error::NoServers);
    }

    for server in &servers {
        server.wait();
    }
    Ok(())
}
