//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use crate::config::Config;
use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService};
use crate::services::validation::validate_username;
use async_trait::async_trait;

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<Config>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<Config>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let is_valid = self
            .store
            .verify_user_password(username, password)
            .await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn get_user(&self, user_id: i32) -> Result<User, AuthError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        validate_username(username).map_err(|e| AuthError::Validation(e.to_string()))?;

        if password.chars().count() < crate::constants::limits::MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters long.".to_string(),
            ));
        }

        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }

        let user = self
            .store
            .create_user(username, password, is_admin, &self.config.security)
            .await?;

        tracing::info!(username = %user.username, is_admin, "User created");
        Ok(user)
    }
}
