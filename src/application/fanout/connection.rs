//! Push-channel connection lifecycle
//!
//! `Connecting → Registered → Closed`. Identity is verified exactly once,
//! while connecting; a failed admission goes straight to `Closed`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::hub::FanoutHub;
use super::registry::Subscription;
use crate::domain::{Identity, IdentityError, IdentityProvider, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Telemetry for the stations the caller owns
    OwnerTelemetry,
    /// Critical-fault alerts for administrators
    AdminAlerts,
}

impl Channel {
    pub fn required_role(&self) -> UserRole {
        match self {
            Self::OwnerTelemetry => UserRole::StationOwner,
            Self::AdminAlerts => UserRole::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnerTelemetry => "owner_telemetry",
            Self::AdminAlerts => "admin_alerts",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Registered,
    Closed,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("role '{actual}' cannot join {channel}")]
    Forbidden {
        channel: &'static str,
        actual: UserRole,
    },
    #[error("connection is already {0:?}")]
    NotConnecting(ConnectionState),
}

#[derive(Debug)]
pub struct Connection {
    channel: Channel,
    state: ConnectionState,
    identity: Option<Identity>,
    subscription_id: Option<Uuid>,
    pub connected_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            state: ConnectionState::Connecting,
            identity: None,
            subscription_id: None,
            connected_at: Utc::now(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity
    }

    /// Verify the credential and, on success, subscribe to the hub
    pub async fn open(
        &mut self,
        hub: &FanoutHub,
        identities: &dyn IdentityProvider,
        credential: Option<&str>,
    ) -> Result<Subscription, AdmissionError> {
        if self.state != ConnectionState::Connecting {
            return Err(AdmissionError::NotConnecting(self.state));
        }

        let identity = match self.verify(identities, credential).await {
            Ok(identity) => identity,
            Err(e) => {
                self.state = ConnectionState::Closed;
                debug!(channel = self.channel.as_str(), error = %e, "Admission refused");
                return Err(e);
            }
        };

        let subscription = match self.channel {
            Channel::OwnerTelemetry => hub.subscribe_owner(identity.user_id),
            Channel::AdminAlerts => hub.subscribe_admin(),
        };

        self.identity = Some(identity);
        self.subscription_id = Some(subscription.id);
        self.state = ConnectionState::Registered;
        info!(
            channel = self.channel.as_str(),
            user_id = identity.user_id,
            "Push channel registered"
        );
        Ok(subscription)
    }

    async fn verify(
        &self,
        identities: &dyn IdentityProvider,
        credential: Option<&str>,
    ) -> Result<Identity, AdmissionError> {
        let credential = credential.ok_or(IdentityError::Missing)?;
        let identity = identities.verify(credential).await?;

        let required = self.channel.required_role();
        if identity.role != required {
            return Err(AdmissionError::Forbidden {
                channel: self.channel.as_str(),
                actual: identity.role,
            });
        }
        Ok(identity)
    }

    /// Leave the hub. Safe to call more than once.
    pub fn close(&mut self, hub: &FanoutHub) {
        if self.state == ConnectionState::Closed {
            return;
        }
        if let (Some(identity), Some(id)) = (self.identity, self.subscription_id.take()) {
            match self.channel {
                Channel::OwnerTelemetry => hub.unsubscribe_owner(identity.user_id, id),
                Channel::AdminAlerts => hub.unsubscribe_admin(id),
            }
        }
        self.state = ConnectionState::Closed;
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;

    struct StaticIdentities(HashMap<&'static str, Result<Identity, IdentityError>>);

    #[async_trait]
    impl IdentityProvider for StaticIdentities {
        async fn verify(&self, credential: &str) -> Result<Identity, IdentityError> {
            self.0
                .get(credential)
                .cloned()
                .unwrap_or(Err(IdentityError::Invalid))
        }
    }

    fn identities() -> StaticIdentities {
        StaticIdentities(HashMap::from([
            ("owner", Ok(Identity::new(10, UserRole::StationOwner))),
            ("admin", Ok(Identity::new(1, UserRole::Admin))),
            ("driver", Ok(Identity::new(20, UserRole::Driver))),
            ("disabled", Err(IdentityError::Disabled)),
        ]))
    }

    #[tokio::test]
    async fn owner_registers_then_closes() {
        let hub = FanoutHub::new();
        let mut conn = Connection::new(Channel::OwnerTelemetry);
        assert_eq!(conn.state(), ConnectionState::Connecting);

        let _sub = conn.open(&hub, &identities(), Some("owner")).await.unwrap();
        assert_eq!(conn.state(), ConnectionState::Registered);
        assert_eq!(hub.owner_subscriber_count(10), 1);

        conn.close(&hub);
        conn.close(&hub);
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(hub.owner_subscriber_count(10), 0);
    }

    #[tokio::test]
    async fn driver_cannot_join_admin_alerts() {
        let hub = FanoutHub::new();
        let mut conn = Connection::new(Channel::AdminAlerts);

        let err = conn.open(&hub, &identities(), Some("driver")).await.unwrap_err();
        assert!(matches!(err, AdmissionError::Forbidden { .. }));
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert_eq!(hub.admin_subscriber_count(), 0);
    }

    #[tokio::test]
    async fn missing_or_disabled_credentials_close_immediately() {
        let hub = FanoutHub::new();

        let mut conn = Connection::new(Channel::AdminAlerts);
        assert_eq!(
            conn.open(&hub, &identities(), None).await.unwrap_err(),
            AdmissionError::Identity(IdentityError::Missing)
        );
        assert_eq!(conn.state(), ConnectionState::Closed);

        let mut conn = Connection::new(Channel::OwnerTelemetry);
        assert_eq!(
            conn.open(&hub, &identities(), Some("disabled")).await.unwrap_err(),
            AdmissionError::Identity(IdentityError::Disabled)
        );
    }

    #[tokio::test]
    async fn identity_is_verified_only_once() {
        let hub = FanoutHub::new();
        let mut conn = Connection::new(Channel::AdminAlerts);
        conn.open(&hub, &identities(), Some("admin")).await.unwrap();

        let again = conn.open(&hub, &identities(), Some("admin")).await.unwrap_err();
        assert_eq!(again, AdmissionError::NotConnecting(ConnectionState::Registered));
        assert_eq!(hub.admin_subscriber_count(), 1);
    }
}
