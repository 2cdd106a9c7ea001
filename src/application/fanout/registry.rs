//! Subscriber registry: thread-safe map of key → live push channels

use std::collections::HashMap;
use std::hash::Hash;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Messages buffered per subscriber before it counts as stalled
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Receiving half handed to the connection task
#[derive(Debug)]
pub struct Subscription {
    pub id: Uuid,
    pub receiver: mpsc::Receiver<String>,
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// All live subscribers, grouped by key.
///
/// A subscriber whose channel is closed, or whose queue is full, is removed
/// the first time a send to it fails; nobody else is affected. Removing a
/// stalled subscriber drops its sender, so its connection drains what is
/// queued and then closes.
pub struct SubscriberRegistry<K> {
    name: &'static str,
    capacity: usize,
    subscribers: DashMap<K, HashMap<Uuid, mpsc::Sender<String>>>,
}

impl<K> SubscriberRegistry<K>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self::with_capacity(name, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            subscribers: DashMap::new(),
        }
    }

    pub fn subscribe(&self, key: K) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();
        self.subscribers
            .entry(key.clone())
            .or_default()
            .insert(id, sender);
        info!(registry = self.name, ?key, %id, "Subscriber registered");
        Subscription { id, receiver }
    }

    pub fn unsubscribe(&self, key: &K, id: Uuid) {
        let removed = self
            .subscribers
            .get_mut(key)
            .map(|mut group| group.remove(&id).is_some())
            .unwrap_or(false);
        self.subscribers.remove_if(key, |_, group| group.is_empty());
        if removed {
            info!(registry = self.name, ?key, %id, "Subscriber removed");
        }
    }

    /// Send to every subscriber under `key`
    pub fn send_to(&self, key: &K, message: &str) -> DeliveryReport {
        // snapshot so no map guard is held while sending
        let targets: Vec<(Uuid, mpsc::Sender<String>)> = match self.subscribers.get(key) {
            Some(group) => group.iter().map(|(id, tx)| (*id, tx.clone())).collect(),
            None => return DeliveryReport::default(),
        };

        let mut report = DeliveryReport::default();
        let mut dead = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(message.to_string()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(registry = self.name, ?key, %id, "Subscriber queue full, disconnecting");
                    dead.push(id);
                }
                Err(TrySendError::Closed(_)) => dead.push(id),
            }
        }

        if !dead.is_empty() {
            report.dropped = dead.len();
            if let Some(mut group) = self.subscribers.get_mut(key) {
                for id in &dead {
                    group.remove(id);
                }
            }
            self.subscribers.remove_if(key, |_, group| group.is_empty());
            debug!(registry = self.name, ?key, dropped = dead.len(), "Removed failed subscribers");
            metrics::counter!("fanout_subscribers_dropped_total", "registry" => self.name)
                .increment(dead.len() as u64);
        }

        report
    }

    pub fn has_subscribers(&self, key: &K) -> bool {
        self.subscribers.get(key).is_some_and(|g| !g.is_empty())
    }

    pub fn subscriber_count(&self, key: &K) -> usize {
        self.subscribers.get(key).map(|g| g.len()).unwrap_or(0)
    }

    pub fn total_subscribers(&self) -> usize {
        self.subscribers.iter().map(|g| g.len()).sum()
    }

    /// Drop every sender; connection tasks see their receiver close
    pub fn clear(&self) {
        let total = self.total_subscribers();
        self.subscribers.clear();
        if total > 0 {
            info!(registry = self.name, total, "Closed all subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failed_subscriber_is_removed_others_still_receive() {
        let reg = SubscriberRegistry::new("test");
        let mut a = reg.subscribe(7i64);
        let b = reg.subscribe(7i64);
        let mut c = reg.subscribe(7i64);
        drop(b.receiver);

        let report = reg.send_to(&7, "hello");
        assert_eq!(report, DeliveryReport { delivered: 2, dropped: 1 });
        assert_eq!(a.receiver.recv().await.as_deref(), Some("hello"));
        assert_eq!(c.receiver.recv().await.as_deref(), Some("hello"));
        assert_eq!(reg.subscriber_count(&7), 2);

        let report = reg.send_to(&7, "again");
        assert_eq!(report, DeliveryReport { delivered: 2, dropped: 0 });
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let reg: SubscriberRegistry<i64> = SubscriberRegistry::new("test");
        assert_eq!(reg.send_to(&1, "x"), DeliveryReport::default());
        assert!(!reg.has_subscribers(&1));
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let reg = SubscriberRegistry::new("test");
        let mut one = reg.subscribe(1i64);
        let mut two = reg.subscribe(2i64);

        reg.send_to(&1, "for-one");
        assert_eq!(one.receiver.recv().await.as_deref(), Some("for-one"));
        assert!(two.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_and_clear() {
        let reg = SubscriberRegistry::new("test");
        let a = reg.subscribe(1i64);
        let mut b = reg.subscribe(1i64);

        reg.unsubscribe(&1, a.id);
        assert_eq!(reg.subscriber_count(&1), 1);

        reg.clear();
        assert_eq!(reg.total_subscribers(), 0);
        assert!(b.receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn stalled_subscriber_is_disconnected_after_its_queue_fills() {
        let reg = SubscriberRegistry::with_capacity("test", 2);
        let mut slow = reg.subscribe(1i64);
        let mut fast = reg.subscribe(1i64);

        for n in 0..2 {
            let msg = format!("m{}", n);
            assert_eq!(reg.send_to(&1, &msg).delivered, 2);
            assert_eq!(fast.receiver.recv().await, Some(msg));
        }

        let report = reg.send_to(&1, "m2");
        assert_eq!(report, DeliveryReport { delivered: 1, dropped: 1 });
        assert_eq!(reg.subscriber_count(&1), 1);
        assert_eq!(fast.receiver.recv().await.as_deref(), Some("m2"));

        // the stalled one keeps what was queued, then sees the close
        assert_eq!(slow.receiver.recv().await.as_deref(), Some("m0"));
        assert_eq!(slow.receiver.recv().await.as_deref(), Some("m1"));
        assert!(slow.receiver.recv().await.is_none());
    }
}
