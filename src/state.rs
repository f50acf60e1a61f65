use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::mpsc;

/// A client blocked in XREAD waiting for new entries on one or more streams.
#[derive(Debug)]
pub struct Subscriber {
    pub client_address: String,
    pub sender: mpsc::Sender<()>,
}

/// Registry of blocked readers keyed by stream name.
#[derive(Debug, Default)]
pub struct State {
    pub subscribers: HashMap<Bytes, Vec<Subscriber>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscriber(&mut self, key: Bytes, subscriber: Subscriber) {
        self.subscribers.entry(key).or_default().push(subscriber);
    }

    pub fn remove_subscriber(&mut self, key: &[u8], client_address: &str) {
        if let Some(subscribers) = self.subscribers.get_mut(key) {
            subscribers.retain(|subscriber| subscriber.client_address != client_address);

            if subscribers.is_empty() {
                self.subscribers.remove(key);
            }
        }
    }

    /// Wakes every reader waiting on `key`. A full channel already holds a
    /// pending wakeup, so send failures are ignored.
    pub fn notify_subscribers(&mut self, key: &[u8]) {
        if let Some(subscribers) = self.subscribers.get(key) {
            for subscriber in subscribers {
                let _ = subscriber.sender.try_send(());
            }
        }
    }

    pub fn subscriber_count(&self, key: &[u8]) -> usize {
        self.subscribers.get(key).map_or(0, Vec::len)
    }
}
