//! Fan-out hub
//!
//! Created once at start-up and shared by the telemetry generator (sender
//! side) and the WebSocket handlers (subscriber side). Torn down with
//! [`FanoutHub::close_all`] on shutdown.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::registry::{DeliveryReport, SubscriberRegistry, Subscription, DEFAULT_QUEUE_CAPACITY};

pub struct FanoutHub {
    owners: SubscriberRegistry<i64>,
    admins: SubscriberRegistry<()>,
}

pub type SharedFanoutHub = Arc<FanoutHub>;

impl FanoutHub {
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Every session gets a queue of `capacity` pushes
    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self {
            owners: SubscriberRegistry::with_capacity("owners", capacity),
            admins: SubscriberRegistry::with_capacity("admins", capacity),
        }
    }

    pub fn shared() -> SharedFanoutHub {
        Arc::new(Self::new())
    }

    pub fn subscribe_owner(&self, owner_id: i64) -> Subscription {
        self.owners.subscribe(owner_id)
    }

    pub fn unsubscribe_owner(&self, owner_id: i64, subscription_id: uuid::Uuid) {
        self.owners.unsubscribe(&owner_id, subscription_id);
    }

    pub fn subscribe_admin(&self) -> Subscription {
        self.admins.subscribe(())
    }

    pub fn unsubscribe_admin(&self, subscription_id: uuid::Uuid) {
        self.admins.unsubscribe(&(), subscription_id);
    }

    /// Best effort; never fails the caller
    pub fn push_to_owner<T: Serialize>(&self, owner_id: i64, payload: &T) -> DeliveryReport {
        if !self.owners.has_subscribers(&owner_id) {
            return DeliveryReport::default();
        }
        match serde_json::to_string(payload) {
            Ok(text) => self.owners.send_to(&owner_id, &text),
            Err(e) => {
                warn!(owner_id, error = %e, "Failed to encode owner push");
                DeliveryReport::default()
            }
        }
    }

    pub fn broadcast_admins<T: Serialize>(&self, payload: &T) -> DeliveryReport {
        if !self.admins.has_subscribers(&()) {
            return DeliveryReport::default();
        }
        match serde_json::to_string(payload) {
            Ok(text) => self.admins.send_to(&(), &text),
            Err(e) => {
                warn!(error = %e, "Failed to encode admin broadcast");
                DeliveryReport::default()
            }
        }
    }

    pub fn owner_subscriber_count(&self, owner_id: i64) -> usize {
        self.owners.subscriber_count(&owner_id)
    }

    pub fn admin_subscriber_count(&self) -> usize {
        self.admins.subscriber_count(&())
    }

    pub fn total_subscribers(&self) -> usize {
        self.owners.total_subscribers() + self.admins.total_subscribers()
    }

    pub fn close_all(&self) {
        self.owners.clear();
        self.admins.clear();
    }
}

impl Default for FanoutHub {
    fn default() -> Self {
        Self::new()
    }
}
