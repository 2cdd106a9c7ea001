//! JWT Token handling
//!
//! Tokens are issued by the auth service; this side only verifies them and
//! resolves the subject against the users table.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Identity, IdentityError, IdentityProvider, RepositoryProvider};

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token expiration time in hours
    pub expiration_hours: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

/// JWT TokenClaims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl TokenClaims {
    pub fn new(user_id: i64, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours);

        Self {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Create a JWT token for a user
pub fn create_token(user_id: i64, config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let token_claims = TokenClaims::new(user_id, config);

    encode(
        &Header::new(Algorithm::HS256),
        &token_claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify and decode a JWT token
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// [`IdentityProvider`] over HS256 bearer tokens.
///
/// The role is read from the user row, not from the token, so a demotion
/// takes effect on the next connect.
pub struct JwtIdentityProvider {
    config: JwtConfig,
    repos: Arc<dyn RepositoryProvider>,
}

impl JwtIdentityProvider {
    pub fn new(config: JwtConfig, repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { config, repos }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, credential: &str) -> Result<Identity, IdentityError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(IdentityError::Missing);
        }

        let claims = verify_token(credential, &self.config).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => IdentityError::Expired,
            _ => IdentityError::Invalid,
        })?;

        let user_id: i64 = claims.sub.parse().map_err(|_| IdentityError::Invalid)?;

        let user = self
            .repos
            .users()
            .find_by_id(user_id)
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?
            .ok_or(IdentityError::Invalid)?;

        if !user.is_active {
            debug!(user_id, "Rejected credential for disabled user");
            return Err(IdentityError::Disabled);
        }

        Ok(Identity::new(user.id, user.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::infrastructure::storage::InMemoryStore;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            expiration_hours: 1,
        }
    }

    async fn provider() -> (JwtIdentityProvider, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let p = JwtIdentityProvider::new(config(), store.clone());
        (p, store)
    }

    #[tokio::test]
    async fn valid_token_resolves_role_from_user_row() {
        let (p, store) = provider().await;
        let admin = store.users().create("a@example.com", UserRole::Admin).await.unwrap();

        let token = create_token(admin.id, &config()).unwrap();
        let identity = p.verify(&token).await.unwrap();
        assert_eq!(identity, Identity::new(admin.id, UserRole::Admin));
    }

    #[tokio::test]
    async fn disabled_user_is_rejected() {
        let (p, store) = provider().await;
        let u = store.users().create("d@example.com", UserRole::Driver).await.unwrap();
        store.users().set_active(u.id, false).await.unwrap();

        let token = create_token(u.id, &config()).unwrap();
        assert_eq!(p.verify(&token).await, Err(IdentityError::Disabled));
    }

    #[tokio::test]
    async fn garbage_and_empty_tokens() {
        let (p, _) = provider().await;
        assert_eq!(p.verify("").await, Err(IdentityError::Missing));
        assert_eq!(p.verify("not-a-jwt").await, Err(IdentityError::Invalid));
    }

    #[tokio::test]
    async fn token_for_unknown_user_is_invalid() {
        let (p, _) = provider().await;
        let token = create_token(77, &config()).unwrap();
        assert_eq!(p.verify(&token).await, Err(IdentityError::Invalid));
    }

    #[tokio::test]
    async fn expired_token() {
        let (p, store) = provider().await;
        let u = store.users().create("e@example.com", UserRole::Driver).await.unwrap();
        let mut cfg = config();
        cfg.expiration_hours = -2;

        let token = create_token(u.id, &cfg).unwrap();
        assert_eq!(p.verify(&token).await, Err(IdentityError::Expired));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = create_token(1, &config()).unwrap();
        let other = JwtConfig {
            secret: "other".into(),
            expiration_hours: 1,
        };
        assert!(verify_token(&token, &other).is_err());
    }
}
