use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::entities::{prelude::*, security_answers, security_questions, users};
use crate::models::question::SecurityPrompt;

/// Repository for recovery questions and the answers users saved for them
pub struct QuestionRepository {
    conn: DatabaseConnection,
}

impl QuestionRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Questions
    // ========================================================================

    /// Ensures one row per [`SecurityPrompt`]. Safe to call on every start.
    pub async fn seed(&self) -> Result<u64> {
        let mut inserted = 0;

        for prompt in SecurityPrompt::ALL {
            let active = security_questions::ActiveModel {
                text: Set(prompt.key().to_string()),
                ..Default::default()
            };

            inserted += SecurityQuestions::insert(active)
                .on_conflict(
                    OnConflict::column(security_questions::Column::Text)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.conn)
                .await
                .with_context(|| format!("Failed to seed question {}", prompt.key()))?;
        }

        if inserted > 0 {
            info!("Seeded {} security questions", inserted);
        }

        Ok(inserted)
    }

    pub async fn list(&self) -> Result<Vec<security_questions::Model>> {
        SecurityQuestions::find()
            .order_by_asc(security_questions::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list security questions")
    }

    pub async fn get(&self, id: i32) -> Result<Option<security_questions::Model>> {
        SecurityQuestions::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query security question")
    }

    pub async fn count(&self) -> Result<u64> {
        SecurityQuestions::find()
            .count(&self.conn)
            .await
            .context("Failed to count security questions")
    }

    // ========================================================================
    // Answers
    // ========================================================================

    /// Creates or replaces the single answer row of `user_id`.
    pub async fn upsert_answer(
        &self,
        user_id: i32,
        question_id: i32,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<(), sea_orm::DbErr> {
        let active = security_answers::ActiveModel {
            user_id: Set(user_id),
            question_id: Set(Some(question_id)),
            answer: Set(Some(answer.to_string())),
            saved_date: Set(now),
            ..Default::default()
        };

        SecurityAnswers::insert(active)
            .on_conflict(
                OnConflict::column(security_answers::Column::UserId)
                    .update_columns([
                        security_answers::Column::QuestionId,
                        security_answers::Column::Answer,
                        security_answers::Column::SavedDate,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    /// Plain insert. Fails on the unique index if the user already has a row.
    pub async fn insert_answer(
        &self,
        user_id: i32,
        question_id: i32,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<(), sea_orm::DbErr> {
        let active = security_answers::ActiveModel {
            user_id: Set(user_id),
            question_id: Set(Some(question_id)),
            answer: Set(Some(answer.to_string())),
            saved_date: Set(now),
            ..Default::default()
        };

        SecurityAnswers::insert(active)
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn answer_for_user(&self, user_id: i32) -> Result<Option<security_answers::Model>> {
        SecurityAnswers::find()
            .filter(security_answers::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query security answer")
    }

    /// True when `user_id` saved exactly `answer` for `question_id`.
    pub async fn answer_matches(&self, user_id: i32, question_id: i32, answer: &str) -> Result<bool> {
        let count = SecurityAnswers::find()
            .filter(security_answers::Column::UserId.eq(user_id))
            .filter(security_answers::Column::QuestionId.eq(question_id))
            .filter(security_answers::Column::Answer.eq(answer))
            .count(&self.conn)
            .await
            .context("Failed to check security answer")?;

        Ok(count > 0)
    }

    pub async fn count_answers(&self) -> Result<u64> {
        SecurityAnswers::find()
            .count(&self.conn)
            .await
            .context("Failed to count security answers")
    }

    pub async fn list_answers(
        &self,
    ) -> Result<Vec<(security_answers::Model, Option<users::Model>)>> {
        SecurityAnswers::find()
            .find_also_related(Users)
            .order_by_asc(security_answers::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list security answers")
    }
}
