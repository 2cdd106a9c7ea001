use async_trait::async_trait;

use super::model::{User, UserRole};
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>>;

    /// Insert a user record. Credentials are managed by the auth service.
    async fn create(&self, email: &str, role: UserRole) -> DomainResult<User>;

    async fn set_active(&self, id: i64, is_active: bool) -> DomainResult<()>;
}
