//! Subscriber-side connection to a single remote publisher: a receive
//! thread that deframes events and hands them to the `NotificationCenter`.

use crate::notification_center::{Display, NotificationCenter};
use crate::proto::Deframer;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{info, warn};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not connect to {address}/{port}")]
    Unreachable { address: String, port: String },
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Lost,
    Error,
}

/// One connection to a remote publisher.
pub struct Server {
    address: String,
    port: String,
    state: Mutex<ConnectionState>,
    socket: Mutex<Option<TcpStream>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    pub fn new(address: impl Into<String>, port: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            address: address.into(),
            port: port.into(),
            state: Mutex::new(ConnectionState::Disconnected),
            socket: Mutex::new(None),
            thread: Mutex::new(None),
        })
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    /// Resolves `address:port`, trying each candidate address in turn and
    /// stopping at the first successful connect. On success, spawns the
    /// receive thread.
    pub fn connect<D: Display + 'static>(
        self: &Arc<Self>,
        center: Arc<NotificationCenter<D>>,
    ) -> Result<()> {
        let target = format!("{}:{}", self.address, self.port);
        let stream = target
            .to_socket_addrs()?
            .find_map(|addr| TcpStream::connect(addr).ok());
        let Some(stream) = stream else {
            *self.state.lock().unwrap() = ConnectionState::Error;
            return Err(Error::Unreachable {
                address: self.address.clone(),
                port: self.port.clone(),
            });
        };

        *self.socket.lock().unwrap() = Some(stream.try_clone()?);
        *self.state.lock().unwrap() = ConnectionState::Connected;

        let this = self.clone();
        let handle = std::thread::spawn(move || this.receive_loop(stream, center));
        *self.thread.lock().unwrap() = Some(handle);
        Ok(())
    }

    fn receive_loop<D: Display>(&self, stream: TcpStream, center: Arc<NotificationCenter<D>>) {
        let mut deframer = Deframer::new(stream);
        loop {
            match deframer.read_event() {
                Ok(Some(raw)) => {
                    let event = raw.with_sender(self.address.clone(), self.port.clone());
                    center.notify(event);
                }
                Ok(None) => {
                    info!("connection to {}/{} closed", self.address, self.port);
                    *self.state.lock().unwrap() = ConnectionState::Lost;
                    return;
                }
                Err(e) => {
                    warn!("receive error from {}/{}: {e}", self.address, self.port);
                    *self.state.lock().unwrap() = ConnectionState::Lost;
                    return;
                }
            }
        }
    }

    /// Closes the socket; the receive thread exits on its next failing
    /// read.
    pub fn disconnect(&self) {
        if let Some(socket) = self.socket.lock().unwrap().take() {
            let _ = socket.shutdown(Shutdown::Both);
        }
        *self.state.lock().unwrap() = ConnectionState::Disconnected;
    }

    /// Blocks until the receive thread has exited.
    pub fn wait(&self) {
        if let Some(handle) = self.thread.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}
