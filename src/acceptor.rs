//! Accepts TCP connections on its own thread and registers them with a
//! [`SubscriberTable`] it does not own.

use crate::hub::SubscriberTable;
use std::net::TcpListener;
use std::sync::Weak;
use std::thread::JoinHandle;
use tracing::{error, info};

/// Owns the accept loop thread. Holds only a [`Weak`] reference to the
/// table it feeds, so the table's owner can shut the acceptor down simply
/// by dropping its `Arc` — the next accepted connection sees a failed
/// upgrade and the thread exits.
pub struct ConnectionAcceptor {
    _handle: JoinHandle<()>,
}

impl ConnectionAcceptor {
    pub fn spawn(listener: TcpListener, table: Weak<SubscriberTable>) -> Self {
        let handle = std::thread::spawn(move || accept_loop(listener, table));
        Self { _handle: handle }
    }
}

fn accept_loop(listener: TcpListener, table: Weak<SubscriberTable>) {
    loop {
        let (socket, addr) = match listener.accept() {
            Ok(pair) => pair,
            Err(e) => {
                error!("accept failed, acceptor thread exiting: {e}");
                return;
            }
        };
        let Some(table) = table.upgrade() else {
            info!("owning table is gone, acceptor thread exiting");
            return;
        };
        match table.add(socket) {
            Ok(id) => info!("accepted subscriber {id} from {addr}"),
            Err(e) => error!("failed to register subscriber from {addr}: {e}"),
        }
    }
}
