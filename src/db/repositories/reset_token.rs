use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::user::{generate_token, to_hex};
use crate::entities::{password_reset_tokens, prelude::*};

/// Repository for single-use password reset tokens
pub struct ResetTokenRepository {
    conn: DatabaseConnection,
}

impl ResetTokenRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Stores a new token for `user_id` and returns the raw value.
    pub async fn issue(&self, user_id: i32, ttl: Duration, now: DateTime<Utc>) -> Result<String> {
        let pruned = self.prune(now).await?;
        if pruned > 0 {
            debug!("Pruned {} stale reset tokens", pruned);
        }

        let token = generate_token();
        let active = password_reset_tokens::ActiveModel {
            user_id: Set(user_id),
            token_hash: Set(hash_token(&token)),
            expires_at: Set(now + ttl),
            used: Set(false),
            created_at: Set(now),
            ..Default::default()
        };

        PasswordResetTokens::insert(active)
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to store reset token")?;

        Ok(token)
    }

    /// True while the token is unused, unexpired and belongs to `user_id`.
    pub async fn is_valid(&self, token: &str, user_id: i32, now: DateTime<Utc>) -> Result<bool> {
        let count = PasswordResetTokens::find()
            .filter(live_token(token, user_id, now))
            .count(&self.conn)
            .await
            .context("Failed to check reset token")?;

        Ok(count > 0)
    }

    /// Marks the token used. Returns false if it was not live, so a token
    /// can be spent at most once.
    pub async fn consume(&self, token: &str, user_id: i32, now: DateTime<Utc>) -> Result<bool> {
        let res = PasswordResetTokens::update_many()
            .col_expr(password_reset_tokens::Column::Used, Expr::value(true))
            .filter(live_token(token, user_id, now))
            .exec(&self.conn)
            .await
            .context("Failed to consume reset token")?;

        Ok(res.rows_affected == 1)
    }

    /// Deletes used and expired tokens.
    pub async fn prune(&self, now: DateTime<Utc>) -> Result<u64> {
        let res = PasswordResetTokens::delete_many()
            .filter(
                Condition::any()
                    .add(password_reset_tokens::Column::Used.eq(true))
                    .add(password_reset_tokens::Column::ExpiresAt.lte(now)),
            )
            .exec(&self.conn)
            .await
            .context("Failed to prune reset tokens")?;

        Ok(res.rows_affected)
    }
}

fn live_token(token: &str, user_id: i32, now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(password_reset_tokens::Column::TokenHash.eq(hash_token(token)))
        .add(password_reset_tokens::Column::UserId.eq(user_id))
        .add(password_reset_tokens::Column::Used.eq(false))
        .add(password_reset_tokens::Column::ExpiresAt.gt(now))
}

#[must_use]
pub fn hash_token(token: &str) -> String {
    to_hex(&Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
        assert_eq!(hash_token("abc").len(), 64);
    }
}
