//! The fan-out hub: a thread-safe registry of connected subscribers.

mod subscriber;

pub use subscriber::Message;
use subscriber::Subscriber;

use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Thread-safe registry of [`Subscriber`]s. A single exclusive mutex
/// guards the whole table; removal is swap-with-last-then-pop, so ids
/// (positions) are volatile across removals — callers should not retain
/// an id across a call that might evict.
#[derive(Default)]
pub struct SubscriberTable {
    inner: Mutex<Vec<Subscriber>>,
}

impl SubscriberTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wraps `socket` in a new [`Subscriber`] and appends it to the table.
    pub fn add(&self, socket: TcpStream) -> std::io::Result<usize> {
        let subscriber = Subscriber::spawn(socket)?;
        let mut table = self.inner.lock().unwrap();
        table.push(subscriber);
        Ok(table.len() - 1)
    }

    /// Closes and evicts the subscriber at `id`, if it still exists.
    pub fn remove(&self, id: usize) {
        let mut table = self.inner.lock().unwrap();
        Self::remove_unsafe(&mut table, id);
    }

    /// Closes every socket and empties the table.
    pub fn remove_all(&self) {
        let mut table = self.inner.lock().unwrap();
        for subscriber in table.drain(..) {
            subscriber.close();
        }
    }

    /// Delivers `msg` to the subscriber at `id`. Evicts it on failure.
    pub fn send_to(&self, msg: Arc<Message>, id: usize) -> bool {
        let mut table = self.inner.lock().unwrap();
        let Some(subscriber) = table.get(id) else {
            return false;
        };
        if subscriber.send(msg) {
            true
        } else {
            Self::remove_unsafe(&mut table, id);
            false
        }
    }

    /// Broadcasts `msg` to every current subscriber. Individual failures
    /// evict that subscriber but never abort the broadcast. Returns
    /// whether at least one subscriber accepted the message.
    pub fn send(&self, msg: Arc<Message>) -> bool {
        let mut table = self.inner.lock().unwrap();
        let mut at_least_one_ok = false;
        // Iterate in reverse so a swap-remove never skips an entry that
        // hasn't been visited yet.
        for idx in (0..table.len()).rev() {
            if table[idx].send(msg.clone()) {
                at_least_one_ok = true;
            } else {
                warn!("evicting subscriber {idx} after failed send");
                Self::remove_unsafe(&mut table, idx);
            }
        }
        at_least_one_ok
    }

    /// Assumes the lock is already held; swap-with-last-then-pop.
    fn remove_unsafe(table: &mut Vec<Subscriber>, id: usize) {
        if id >= table.len() {
            return;
        }
        table[id].close();
        let last = table.len() - 1;
        table.swap(id, last);
        table.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    fn accepted_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        (server_side, client)
    }

    #[test]
    fn broadcast_delivers_to_a_live_subscriber() {
        let table = SubscriberTable::new();
        let (server_side, mut client) = accepted_pair();
        table.add(server_side).unwrap();

        table.send(Arc::new(Message::new(b"hi".to_vec())));

        std::thread::sleep(std::time::Duration::from_millis(50));
        let mut buf = [0u8; 2];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hi");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn dead_subscriber_is_evicted_on_next_broadcast() {
        let table = SubscriberTable::new();
        let (server_side, client) = accepted_pair();
        table.add(server_side).unwrap();
        drop(client); // peer closes its end

        // first broadcast may or may not observe the failed write yet,
        // depending on scheduling; give the worker thread a moment, then
        // broadcast again to force eviction.
        table.send(Arc::new(Message::new(b"one".to_vec())));
        std::thread::sleep(std::time::Duration::from_millis(100));
        table.send(Arc::new(Message::new(b"two".to_vec())));
        std::thread::sleep(std::time::Duration::from_millis(100));

        assert_eq!(table.len(), 0);
    }

    #[test]
    fn remove_all_empties_the_table() {
        let table = SubscriberTable::new();
        let (a, _ca) = accepted_pair();
        let (b, _cb) = accepted_pair();
        table.add(a).unwrap();
        table.add(b).unwrap();
        assert_eq!(table.len(), 2);
        table.remove_all();
        assert_eq!(table.len(), 0);
    }
}
