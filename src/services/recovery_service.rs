//! Domain service for the security-question workflow and the two-stage
//! password recovery (challenge, then reset).

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::question::{PriorAnswer, QuestionView};
use crate::services::validation::ValidationError;

/// Errors specific to recovery operations.
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Question not found: {0}")]
    QuestionNotFound(i32),

    /// Unknown user, unknown question or wrong answer. Never says which.
    #[error("Check username, question and answer!")]
    ChallengeFailed,

    #[error("Check user!")]
    UnknownUser,

    #[error("Reset link is invalid or has expired.")]
    InvalidToken,

    #[error("{0}")]
    Policy(&'static str),

    #[error("Your answer was already saved.")]
    Conflict,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecoveryError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecoveryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of a passed challenge: who may reset, and the token proving it.
#[derive(Debug, Clone)]
pub struct ChallengePass {
    pub username: String,
    /// `None` when reset tokens are disabled.
    pub token: Option<String>,
}

/// Form input of the reset stage.
#[derive(Debug, Clone, Copy)]
pub struct ResetRequest<'a> {
    pub username: &'a str,
    pub password1: &'a str,
    pub password2: &'a str,
    pub token: Option<&'a str>,
}

/// Domain service trait for recovery.
#[async_trait::async_trait]
pub trait RecoveryService: Send + Sync {
    /// The fixed prompts, ordered by id.
    async fn list_questions(&self) -> Result<Vec<QuestionView>, RecoveryError>;

    async fn prior_answer(&self, user_id: i32) -> Result<Option<PriorAnswer>, RecoveryError>;

    /// Validates and upserts the single answer of `user_id`.
    async fn save_answer(
        &self,
        user_id: i32,
        question_id: i32,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RecoveryError>;

    /// Stage one. On success a reset token is issued when tokens are required.
    async fn challenge(
        &self,
        username: &str,
        question_id: i32,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<ChallengePass, RecoveryError>;

    /// Stage two. Applies the password policy and stores the new hash.
    async fn reset_password(
        &self,
        request: ResetRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), RecoveryError>;
}
