//! Appointment command handlers

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{BookingService, SeaOrmBookingService};

const CLI_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses a naive UTC start time, or a full RFC 3339 timestamp.
pub fn parse_start(input: &str) -> anyhow::Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }

    CLI_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(|naive| naive.and_utc())
        .with_context(|| format!("Unrecognised start time '{input}', expected YYYY-MM-DD HH:MM"))
}

pub async fn cmd_appointment_add(config: &Config, start: &str) -> anyhow::Result<()> {
    let start = parse_start(start)?;
    let store = Store::new(&config.general.database_path).await?;
    let booking = SeaOrmBookingService::new(store, Arc::new(config.clone()));

    let created = booking.create_appointment(start).await?;
    println!("Created {}", created.summary);

    if start <= Utc::now() {
        println!("Note: this start time is already in the past and cannot be booked.");
    }

    Ok(())
}

pub async fn cmd_appointment_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let booking = SeaOrmBookingService::new(store, Arc::new(config.clone()));

    let roster = booking.roster(Utc::now()).await?;

    if roster.is_empty() {
        println!("No appointments.");
        println!();
        println!("Add one with: booker appointment add \"2030-01-01 10:00\"");
        return Ok(());
    }

    println!("Appointments ({} total)", roster.len());
    println!("{:-<70}", "");
    for appointment in roster {
        let marker = if appointment.open { "○" } else { "•" };
        println!("{marker} {}", appointment.summary);
        if !appointment.note.is_empty() {
            println!("  Note: {}", appointment.note);
        }
    }

    println!();
    println!("Legend: ○ Open | • Booked or past");

    Ok(())
}
