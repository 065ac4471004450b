use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::{appointments, users};

/// Display format used for start times across the UI and the CLI.
pub const START_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Appointment joined with its owner's username, ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    pub id: i32,
    pub start_date: String,
    pub book_date: String,
    pub note: String,
    pub owner: Option<String>,
    pub open: bool,
    pub summary: String,
}

impl AppointmentView {
    #[must_use]
    pub fn new(
        appointment: &appointments::Model,
        owner: Option<&users::Model>,
        now: DateTime<Utc>,
    ) -> Self {
        let owner = owner.map(|u| u.username.clone());
        Self {
            id: appointment.id,
            start_date: appointment.start_date.format(START_FORMAT).to_string(),
            book_date: appointment.book_date.format(START_FORMAT).to_string(),
            note: appointment.give_message(),
            summary: summary(appointment, owner.as_deref()),
            owner,
            open: appointment.is_open_for_booking(now),
        }
    }
}

/// `ID 3 : 2026-01-01 10:00 UTC (booked for alice)`
#[must_use]
pub fn summary(appointment: &appointments::Model, owner: Option<&str>) -> String {
    let booked = owner.map_or_else(
        || "not booked yet".to_string(),
        |name| format!("booked for {name}"),
    );
    format!(
        "ID {} : {} ({booked})",
        appointment.id,
        appointment.start_date.format(START_FORMAT)
    )
}
