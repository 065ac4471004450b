//! `SeaORM` implementation of the `BookingService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{BookAttempt, Store};
use crate::models::appointment::AppointmentView;
use crate::services::booking_service::{BookingError, BookingOutcome, BookingService, HomeView};
use crate::services::validation::validate_note;

pub struct SeaOrmBookingService {
    store: Store,
    config: Arc<Config>,
}

impl SeaOrmBookingService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<Config>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl BookingService for SeaOrmBookingService {
    async fn home(&self, user_id: i32, now: DateTime<Utc>) -> Result<HomeView, BookingError> {
        let available = self
            .store
            .list_available_appointments(now)
            .await?
            .iter()
            .map(|a| AppointmentView::new(a, None, now))
            .collect();

        let mine = self
            .store
            .list_user_appointments(user_id)
            .await?
            .iter()
            .map(|a| AppointmentView::new(a, None, now))
            .collect();

        Ok(HomeView { available, mine })
    }

    async fn roster(&self, now: DateTime<Utc>) -> Result<Vec<AppointmentView>, BookingError> {
        let rows = self.store.list_all_appointments().await?;
        Ok(rows
            .iter()
            .map(|(appointment, owner)| AppointmentView::new(appointment, owner.as_ref(), now))
            .collect())
    }

    async fn book(
        &self,
        appointment_id: i32,
        user_id: i32,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<BookingOutcome, BookingError> {
        if self.config.security.validate_booking_note {
            if let Some(note) = note {
                validate_note(note)?;
            }
        }

        let note = note.filter(|n| !n.is_empty()).map(str::to_string);

        match self
            .store
            .book_appointment(appointment_id, user_id, note, now)
            .await?
        {
            BookAttempt::Booked => {
                info!(appointment_id, user_id, "Appointment booked");
                Ok(BookingOutcome::Booked)
            }
            BookAttempt::InPast => Ok(BookingOutcome::InPast),
            BookAttempt::AlreadyBooked => {
                warn!(appointment_id, user_id, "Booking rejected, slot already taken");
                Ok(BookingOutcome::AlreadyBooked)
            }
            BookAttempt::NotFound => Err(BookingError::NotFound(appointment_id)),
        }
    }

    async fn create_appointment(
        &self,
        start_date: DateTime<Utc>,
    ) -> Result<AppointmentView, BookingError> {
        let model = self.store.create_appointment(start_date).await?;
        Ok(AppointmentView::new(&model, None, Utc::now()))
    }

    async fn delete_appointment(&self, appointment_id: i32) -> Result<(), BookingError> {
        if self.store.delete_appointment(appointment_id).await? {
            info!(appointment_id, "Appointment deleted");
            Ok(())
        } else {
            Err(BookingError::NotFound(appointment_id))
        }
    }
}
