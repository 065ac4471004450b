use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use crate::entities::{appointments, prelude::*, users};

/// Result of a single booking write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookAttempt {
    Booked,
    NotFound,
    InPast,
    AlreadyBooked,
}

/// Repository for appointment slots
pub struct AppointmentRepository {
    conn: DatabaseConnection,
}

impl AppointmentRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<appointments::Model>> {
        Appointments::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query appointment")
    }

    /// Future, unowned slots, soonest first.
    pub async fn list_available(&self, now: DateTime<Utc>) -> Result<Vec<appointments::Model>> {
        Appointments::find()
            .filter(appointments::Column::UserId.is_null())
            .filter(appointments::Column::StartDate.gt(now))
            .order_by_asc(appointments::Column::StartDate)
            .all(&self.conn)
            .await
            .context("Failed to list available appointments")
    }

    /// Slots owned by `user_id`, latest first.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<appointments::Model>> {
        Appointments::find()
            .filter(appointments::Column::UserId.eq(user_id))
            .order_by_desc(appointments::Column::StartDate)
            .all(&self.conn)
            .await
            .context("Failed to list user appointments")
    }

    /// Every slot with its owner, soonest first.
    pub async fn list_all(&self) -> Result<Vec<(appointments::Model, Option<users::Model>)>> {
        Appointments::find()
            .find_also_related(Users)
            .order_by_asc(appointments::Column::StartDate)
            .all(&self.conn)
            .await
            .context("Failed to list appointments")
    }

    pub async fn create(&self, start_date: DateTime<Utc>) -> Result<appointments::Model> {
        let active = appointments::ActiveModel {
            start_date: Set(start_date),
            book_date: Set(Utc::now()),
            msg_text: Set(None),
            user_id: Set(None),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to create appointment")?;

        info!("Created appointment {} at {}", model.id, model.start_date);
        Ok(model)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = Appointments::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete appointment")?;

        Ok(res.rows_affected > 0)
    }

    /// Assigns the slot to `user_id` if it is still open at `now`.
    ///
    /// The write comes first and is conditional on the slot being unowned and
    /// in the future, so of two concurrent bookers only one sees a row
    /// affected. The loser reads the row back to learn why.
    pub async fn book(
        &self,
        id: i32,
        user_id: i32,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<BookAttempt> {
        let txn = self.conn.begin().await?;

        let res = Appointments::update_many()
            .col_expr(appointments::Column::UserId, Expr::value(user_id))
            .col_expr(appointments::Column::MsgText, Expr::value(note))
            .col_expr(appointments::Column::BookDate, Expr::value(now))
            .filter(appointments::Column::Id.eq(id))
            .filter(appointments::Column::UserId.is_null())
            .filter(appointments::Column::StartDate.gt(now))
            .exec(&txn)
            .await
            .context("Failed to book appointment")?;

        if res.rows_affected == 1 {
            txn.commit().await?;
            return Ok(BookAttempt::Booked);
        }

        let current = Appointments::find_by_id(id).one(&txn).await?;
        txn.rollback().await?;

        Ok(match current {
            None => BookAttempt::NotFound,
            Some(slot) if slot.start_date <= now => BookAttempt::InPast,
            Some(_) => BookAttempt::AlreadyBooked,
        })
    }
}
