//! Domain service for appointment slots: listings, booking and the
//! administrative create/delete operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::appointment::AppointmentView;
use crate::services::validation::ValidationError;

/// Errors specific to booking operations.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Appointment not found: {0}")]
    NotFound(i32),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for BookingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BookingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// What happened to a booking request that reached storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    Booked,
    /// Start time is not after `now`. Nothing changed.
    InPast,
    /// Someone else owns the slot. Nothing changed.
    AlreadyBooked,
}

/// Payload of the home page.
#[derive(Debug, Clone, Serialize)]
pub struct HomeView {
    pub available: Vec<AppointmentView>,
    pub mine: Vec<AppointmentView>,
}

/// Domain service trait for booking.
#[async_trait::async_trait]
pub trait BookingService: Send + Sync {
    /// Open slots (soonest first) and the caller's own slots (latest first).
    async fn home(&self, user_id: i32, now: DateTime<Utc>) -> Result<HomeView, BookingError>;

    /// Every appointment with its owner, soonest first.
    async fn roster(&self, now: DateTime<Utc>) -> Result<Vec<AppointmentView>, BookingError>;

    /// Assigns an open slot to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotFound`] for an unknown slot and
    /// [`BookingError::Validation`] for a rejected note.
    async fn book(
        &self,
        appointment_id: i32,
        user_id: i32,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<BookingOutcome, BookingError>;

    async fn create_appointment(
        &self,
        start_date: DateTime<Utc>,
    ) -> Result<AppointmentView, BookingError>;

    async fn delete_appointment(&self, appointment_id: i32) -> Result<(), BookingError>;
}
