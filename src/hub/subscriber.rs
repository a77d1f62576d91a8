//! A single subscriber's socket, outbound queue, and failure state.

use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

/// An immutable, reference-counted buffer shared across one broadcast.
pub struct Message(Vec<u8>);

impl Message {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// One connected remote subscriber.
///
/// Delivery is asynchronous: `send` hands the message to a dedicated
/// worker thread over an unbounded channel and returns immediately. The
/// worker writes the full buffer (looping over partial sends) and, on the
/// first failed write, marks the subscriber `failed` and exits — the next
/// `send` call observes the flag and reports failure without attempting a
/// new write, which is what drives eviction in the owning table.
pub struct Subscriber {
    sender: mpsc::Sender<Arc<Message>>,
    failed: Arc<AtomicBool>,
    socket: TcpStream,
    _worker: JoinHandle<()>,
}

impl Subscriber {
    pub fn spawn(socket: TcpStream) -> std::io::Result<Self> {
        let worker_socket = socket.try_clone()?;
        let (tx, rx) = mpsc::channel::<Arc<Message>>();
        let failed = Arc::new(AtomicBool::new(false));
        let worker_failed = failed.clone();
        let worker = std::thread::spawn(move || {
            let mut socket = worker_socket;
            while let Ok(msg) = rx.recv() {
                if write_all(&mut socket, msg.as_bytes()).is_err() {
                    worker_failed.store(true, Ordering::SeqCst);
                    break;
                }
            }
        });
        Ok(Self {
            sender: tx,
            failed,
            socket,
            _worker: worker,
        })
    }

    /// Returns `true` if the message was accepted for delivery. `false`
    /// means this subscriber has failed and should be evicted by the
    /// caller; no further sends should be attempted.
    pub fn send(&self, msg: Arc<Message>) -> bool {
        if self.failed.load(Ordering::SeqCst) {
            return false;
        }
        self.sender.send(msg).is_ok()
    }

    /// Closes the socket; the worker thread notices on its next write (or
    /// exits on its own once the sender side is dropped).
    pub fn close(&self) {
        let _ = self.socket.shutdown(Shutdown::Both);
        debug!("subscriber connection closed");
    }
}

fn write_all(socket: &mut TcpStream, mut buf: &[u8]) -> std::io::Result<()> {
    while !buf.is_empty() {
        let n = socket.write(buf)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "failed to write whole message",
            ));
        }
        buf = &buf[n..];
    }
    Ok(())
}
