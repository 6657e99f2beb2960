//! In-memory shared key-value store with change notifications.
//!
//! Every key is a single-slot mailbox: a write replaces the previous value and
//! wakes the watchers of that key. Watchers only ever observe the latest
//! value, so a burst of writes may be seen as a single change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[derive(Clone, Default)]
pub struct SharedStore {
    slots: Arc<Mutex<HashMap<String, watch::Sender<Option<String>>>>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`, if it was ever written.
    pub fn get(&self, key: &str) -> Option<String> {
        let slots = self.slots.lock().unwrap();
        slots.get(key).and_then(|slot| slot.borrow().clone())
    }

    /// Last-write-wins replacement of the value of `key`.
    pub fn replace_and_notify(&self, key: &str, value: String) {
        let mut slots = self.slots.lock().unwrap();
        slots
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .send_replace(Some(value));
    }

    /// Watches `key` for writes made after this call.
    pub fn watch(&self, key: &str) -> StoreWatcher {
        let mut slots = self.slots.lock().unwrap();
        let receiver = slots
            .entry(key.to_string())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe();
        StoreWatcher { receiver }
    }
}

pub struct StoreWatcher {
    receiver: watch::Receiver<Option<String>>,
}

impl StoreWatcher {
    /// Latest value, marked as seen.
    pub fn latest(&mut self) -> Option<String> {
        self.receiver.borrow_and_update().clone()
    }

    /// Waits for the next write and returns the latest value.
    ///
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<String> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(value) = self.receiver.borrow_and_update().clone() {
                return Some(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn get_returns_last_written_value() {
        let store = SharedStore::new();
        assert_eq!(store.get("k"), None);
        store.replace_and_notify("k", "one".to_string());
        store.replace_and_notify("k", "two".to_string());
        assert_eq!(store.get("k").as_deref(), Some("two"));
        assert_eq!(store.get("other"), None);
    }

    #[tokio::test]
    async fn watcher_sees_only_writes_after_subscribing() {
        let store = SharedStore::new();
        store.replace_and_notify("k", "before".to_string());

        let mut watcher = store.watch("k");
        let pending = tokio::time::timeout(Duration::from_millis(20), watcher.changed()).await;
        assert!(pending.is_err());

        store.replace_and_notify("k", "after".to_string());
        assert_eq!(watcher.changed().await.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn burst_of_writes_collapses_to_latest() {
        let store = SharedStore::new();
        let mut watcher = store.watch("k");
        for i in 0..5 {
            store.replace_and_notify("k", i.to_string());
        }
        assert_eq!(watcher.changed().await.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let store = SharedStore::new();
        let mut a = store.watch("a");
        store.replace_and_notify("b", "x".to_string());
        store.replace_and_notify("a", "y".to_string());
        assert_eq!(a.changed().await.as_deref(), Some("y"));
    }
}
