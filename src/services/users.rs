use crate::{
    db::DbPool,
    entities::user::{self, Column as UserColumn, Entity as User},
    errors::ServiceError,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Service for managing shopper accounts
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = User::find()
            .order_by_asc(UserColumn::UserId)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error when listing users");
                ServiceError::DatabaseError(e)
            })?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: i32) -> Result<UserResponse, ServiceError> {
        let user = super::require_user(&*self.db_pool, user_id).await?;
        Ok(user.into())
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: CreateUserInput) -> Result<UserResponse, ServiceError> {
        input.validate()?;
        self.ensure_email_available(&input.email, None).await?;

        let user = user::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            password: Set(hash_password(&input.password)?),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(user_id = user.user_id, "User created");
        Ok(user.into())
    }

    /// PUT semantics: every field is replaced.
    #[instrument(skip(self, input))]
    pub async fn replace_user(
        &self,
        user_id: i32,
        input: CreateUserInput,
    ) -> Result<UserResponse, ServiceError> {
        input.validate()?;
        self.patch_user(
            user_id,
            UpdateUserInput {
                name: Some(input.name),
                email: Some(input.email),
                password: Some(input.password),
            },
        )
        .await
    }

    #[instrument(skip(self, input))]
    pub async fn patch_user(
        &self,
        user_id: i32,
        input: UpdateUserInput,
    ) -> Result<UserResponse, ServiceError> {
        input.validate()?;
        let existing = super::require_user(&*self.db_pool, user_id).await?;

        if let Some(email) = &input.email {
            self.ensure_email_available(email, Some(user_id)).await?;
        }

        let mut user: user::ActiveModel = existing.into();
        if let Some(name) = input.name {
            user.name = Set(name);
        }
        if let Some(email) = input.email {
            user.email = Set(email);
        }
        if let Some(password) = input.password {
            user.password = Set(hash_password(&password)?);
        }

        let updated = user.update(&*self.db_pool).await?;
        info!(user_id, "User updated");
        Ok(updated.into())
    }

    /// Removes the user together with their cart, orders and behavior logs.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: i32) -> Result<(), ServiceError> {
        let user = super::require_user(&*self.db_pool, user_id).await?;
        user.delete(&*self.db_pool).await?;
        info!(user_id, "User deleted");
        Ok(())
    }

    async fn ensure_email_available(
        &self,
        email: &str,
        owner: Option<i32>,
    ) -> Result<(), ServiceError> {
        let mut query = User::find().filter(UserColumn::Email.eq(email));
        if let Some(owner) = owner {
            query = query.filter(UserColumn::UserId.ne(owner));
        }

        if query.one(&*self.db_pool).await?.is_some() {
            warn!(%email, "Rejected duplicate email");
            return Err(ServiceError::Conflict(
                "A user with this email already exists.".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Jane Doe",
    "email": "jane@example.com",
    "password": "correct horse battery staple"
}))]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email, length(max = 254))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub password: Option<String>,
}

/// Public user representation; the password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            user_id: model.user_id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    fn verifies(password: &str, stored_hash: &str) -> bool {
        let parsed = PasswordHash::new(stored_hash).unwrap();
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verifies("s3cret", &hash));
        assert!(!verifies("wrong", &hash));
    }

    #[test]
    fn rejects_invalid_email() {
        let input = CreateUserInput {
            name: "Jane".into(),
            email: "not-an-email".into(),
            password: "pw".into(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn rejects_overlong_name() {
        let input = UpdateUserInput {
            name: Some("x".repeat(101)),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}
