use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use tracing::info;

use crate::config::SecurityConfig;
use crate::constants::defaults::{ADMIN_PASSWORD, ADMIN_USERNAME};
use crate::entities::{appointments, security_answers, security_questions, users};

pub mod migrator;
pub mod repositories;

pub use repositories::appointment::BookAttempt;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    /// Connects, applies migrations and seeds the fixed security questions.
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(std::time::Duration::from_secs(10))
            .acquire_timeout(std::time::Duration::from_secs(10))
            .idle_timeout(std::time::Duration::from_secs(300))
            .max_lifetime(std::time::Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        let store = Self { conn };
        store.seed_security_questions().await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(store)
    }

    fn appointment_repo(&self) -> repositories::appointment::AppointmentRepository {
        repositories::appointment::AppointmentRepository::new(self.conn.clone())
    }

    fn question_repo(&self) -> repositories::question::QuestionRepository {
        repositories::question::QuestionRepository::new(self.conn.clone())
    }

    fn reset_token_repo(&self) -> repositories::reset_token::ResetTokenRepository {
        repositories::reset_token::ResetTokenRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Bootstrap
    // ========================================================================

    /// Idempotently ensures the three recovery questions exist.
    pub async fn seed_security_questions(&self) -> Result<u64> {
        self.question_repo().seed().await
    }

    // ========================================================================
    // Appointments
    // ========================================================================

    pub async fn get_appointment(&self, id: i32) -> Result<Option<appointments::Model>> {
        self.appointment_repo().get(id).await
    }

    pub async fn list_available_appointments(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<appointments::Model>> {
        self.appointment_repo().list_available(now).await
    }

    pub async fn list_user_appointments(&self, user_id: i32) -> Result<Vec<appointments::Model>> {
        self.appointment_repo().list_for_user(user_id).await
    }

    pub async fn list_all_appointments(
        &self,
    ) -> Result<Vec<(appointments::Model, Option<users::Model>)>> {
        self.appointment_repo().list_all().await
    }

    pub async fn create_appointment(&self, start_date: DateTime<Utc>) -> Result<appointments::Model> {
        self.appointment_repo().create(start_date).await
    }

    pub async fn delete_appointment(&self, id: i32) -> Result<bool> {
        self.appointment_repo().delete(id).await
    }

    pub async fn book_appointment(
        &self,
        id: i32,
        user_id: i32,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<BookAttempt> {
        self.appointment_repo().book(id, user_id, note, now).await
    }

    // ========================================================================
    // Questions & answers
    // ========================================================================

    pub async fn list_questions(&self) -> Result<Vec<security_questions::Model>> {
        self.question_repo().list().await
    }

    pub async fn get_question(&self, id: i32) -> Result<Option<security_questions::Model>> {
        self.question_repo().get(id).await
    }

    pub async fn count_questions(&self) -> Result<u64> {
        self.question_repo().count().await
    }

    pub async fn upsert_answer(
        &self,
        user_id: i32,
        question_id: i32,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<(), sea_orm::DbErr> {
        self.question_repo()
            .upsert_answer(user_id, question_id, answer, now)
            .await
    }

    pub async fn insert_answer(
        &self,
        user_id: i32,
        question_id: i32,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<(), sea_orm::DbErr> {
        self.question_repo()
            .insert_answer(user_id, question_id, answer, now)
            .await
    }

    pub async fn get_answer_for_user(
        &self,
        user_id: i32,
    ) -> Result<Option<security_answers::Model>> {
        self.question_repo().answer_for_user(user_id).await
    }

    pub async fn answer_matches(
        &self,
        user_id: i32,
        question_id: i32,
        answer: &str,
    ) -> Result<bool> {
        self.question_repo()
            .answer_matches(user_id, question_id, answer)
            .await
    }

    pub async fn count_answers(&self) -> Result<u64> {
        self.question_repo().count_answers().await
    }

    pub async fn list_answers(
        &self,
    ) -> Result<Vec<(security_answers::Model, Option<users::Model>)>> {
        self.question_repo().list_answers().await
    }

    // ========================================================================
    // Reset tokens
    // ========================================================================

    pub async fn issue_reset_token(
        &self,
        user_id: i32,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String> {
        self.reset_token_repo().issue(user_id, ttl, now).await
    }

    pub async fn is_reset_token_valid(
        &self,
        token: &str,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.reset_token_repo().is_valid(token, user_id, now).await
    }

    pub async fn consume_reset_token(
        &self,
        token: &str,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.reset_token_repo().consume(token, user_id, now).await
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo()
            .create(username, password, is_admin, config)
            .await
    }

    /// True while the seeded admin account still accepts its default password.
    pub async fn default_admin_active(&self) -> Result<bool> {
        self.verify_user_password(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(
        &self,
        user_id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(user_id, new_password, config)
            .await
    }
}
