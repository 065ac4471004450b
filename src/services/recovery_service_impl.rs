//! `SeaORM` implementation of the `RecoveryService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::SqlErr;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Store;
use crate::models::question::{PriorAnswer, QuestionView};
use crate::services::password_policy::{PasswordCandidate, PasswordPolicy};
use crate::services::recovery_service::{
    ChallengePass, RecoveryError, RecoveryService, ResetRequest,
};
use crate::services::validation::{validate_answer, validate_challenge_answer, validate_username};

pub struct SeaOrmRecoveryService {
    store: Store,
    config: Arc<Config>,
    policy: PasswordPolicy,
}

impl SeaOrmRecoveryService {
    #[must_use]
    pub fn new(store: Store, config: Arc<Config>) -> Self {
        let policy = PasswordPolicy::from_config(&config.security);
        Self {
            store,
            config,
            policy,
        }
    }

    fn token_ttl(&self) -> Duration {
        Duration::minutes(self.config.security.reset_token_ttl_minutes)
    }
}

#[async_trait]
impl RecoveryService for SeaOrmRecoveryService {
    async fn list_questions(&self) -> Result<Vec<QuestionView>, RecoveryError> {
        let questions = self.store.list_questions().await?;
        Ok(questions.into_iter().map(QuestionView::from).collect())
    }

    async fn prior_answer(&self, user_id: i32) -> Result<Option<PriorAnswer>, RecoveryError> {
        let answer = self.store.get_answer_for_user(user_id).await?;
        Ok(answer.map(|a| PriorAnswer {
            question_id: a.question_id,
            saved_date: a.saved_date.to_rfc3339(),
        }))
    }

    async fn save_answer(
        &self,
        user_id: i32,
        question_id: i32,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RecoveryError> {
        let answer = validate_answer(answer)?;

        if self.store.get_question(question_id).await?.is_none() {
            return Err(RecoveryError::QuestionNotFound(question_id));
        }

        match self
            .store
            .upsert_answer(user_id, question_id, answer, now)
            .await
        {
            Ok(()) => {
                info!(user_id, question_id, "Security answer saved");
                Ok(())
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                warn!(user_id, "Concurrent security answer save");
                Err(RecoveryError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn challenge(
        &self,
        username: &str,
        question_id: i32,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<ChallengePass, RecoveryError> {
        let answer = validate_challenge_answer(answer)?;
        let username = validate_username(username)?;

        let user = self.store.get_user_by_username(username).await?;
        let question = self.store.get_question(question_id).await?;

        let (Some(user), Some(_)) = (user, question) else {
            warn!(username, question_id, "Recovery challenge failed");
            return Err(RecoveryError::ChallengeFailed);
        };

        if !self.store.answer_matches(user.id, question_id, answer).await? {
            warn!(username, question_id, "Recovery challenge failed");
            return Err(RecoveryError::ChallengeFailed);
        }

        let token = if self.config.security.require_reset_token {
            Some(
                self.store
                    .issue_reset_token(user.id, self.token_ttl(), now)
                    .await?,
            )
        } else {
            None
        };

        info!(username, "Recovery challenge passed");
        Ok(ChallengePass {
            username: user.username,
            token,
        })
    }

    async fn reset_password(
        &self,
        request: ResetRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), RecoveryError> {
        let user = self
            .store
            .get_user_by_username(request.username)
            .await?
            .ok_or(RecoveryError::UnknownUser)?;

        let require_token = self.config.security.require_reset_token;
        let token = request.token.filter(|t| !t.is_empty());

        if require_token {
            let Some(token) = token else {
                return Err(RecoveryError::InvalidToken);
            };
            if !self.store.is_reset_token_valid(token, user.id, now).await? {
                return Err(RecoveryError::InvalidToken);
            }
        }

        self.policy
            .check(&PasswordCandidate {
                username: &user.username,
                password: request.password1,
                confirmation: request.password2,
            })
            .map_err(RecoveryError::Policy)?;

        if require_token {
            let consumed = match token {
                Some(token) => self.store.consume_reset_token(token, user.id, now).await?,
                None => false,
            };
            if !consumed {
                return Err(RecoveryError::InvalidToken);
            }
        }

        self.store
            .update_user_password(user.id, request.password1, &self.config.security)
            .await?;

        info!(username = %user.username, "Password reset");
        Ok(())
    }
}
