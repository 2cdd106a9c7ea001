//! Verified-identity contract
//!
//! Connection handlers and HTTP middleware hand a bearer credential to an
//! [`IdentityProvider`] and get back who is calling, or why not.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::UserRole;
use crate::domain::DomainError;

/// A caller whose credential has been checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub role: UserRole,
}

impl Identity {
    pub fn new(user_id: i64, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_role(&self, allowed: &[UserRole]) -> Result<(), DomainError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(DomainError::Unauthorized(format!(
                "role '{}' is not permitted here",
                self.role
            )))
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("missing credential")]
    Missing,
    #[error("invalid credential")]
    Invalid,
    #[error("credential expired")]
    Expired,
    #[error("user account is disabled")]
    Disabled,
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_role_rejects_other_roles() {
        let driver = Identity::new(4, UserRole::Driver);
        assert!(driver.require_role(&[UserRole::Driver]).is_ok());
        assert!(matches!(
            driver.require_role(&[UserRole::Admin, UserRole::StationOwner]),
            Err(DomainError::Unauthorized(_))
        ));
    }
}
