//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, NotSet, Set};
use tracing::debug;

use super::{corrupt, db_err};
use crate::domain::user::UserRepository;
use crate::domain::{DomainError, DomainResult, User, UserRole};
use crate::infrastructure::database::entities::user;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: user::Model) -> DomainResult<User> {
    Ok(User {
        id: m.id,
        role: m.role.parse::<UserRole>().map_err(|e| corrupt("users.role", e))?,
        email: m.email,
        is_active: m.is_active,
    })
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn create(&self, email: &str, role: UserRole) -> DomainResult<User> {
        debug!(email, role = %role, "Creating user");
        let model = user::ActiveModel {
            id: NotSet,
            email: Set(email.to_string()),
            role: Set(role.as_str().to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        };
        let saved = model.insert(&self.db).await.map_err(db_err)?;
        model_to_domain(saved)
    }

    async fn set_active(&self, id: i64, is_active: bool) -> DomainResult<()> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("User", id))?;

        let mut model: user::ActiveModel = existing.into();
        model.is_active = Set(is_active);
        model.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::test_connection;

    #[tokio::test]
    async fn create_then_disable() {
        let repo = SeaOrmUserRepository::new(test_connection().await);
        let u = repo.create("owner@example.com", UserRole::StationOwner).await.unwrap();
        assert!(u.is_active);
        assert_eq!(u.role, UserRole::StationOwner);

        repo.set_active(u.id, false).await.unwrap();
        let reloaded = repo.find_by_id(u.id).await.unwrap().unwrap();
        assert!(!reloaded.is_active);
    }

    #[tokio::test]
    async fn disabling_unknown_user_is_not_found() {
        let repo = SeaOrmUserRepository::new(test_connection().await);
        assert!(matches!(
            repo.set_active(404, false).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
