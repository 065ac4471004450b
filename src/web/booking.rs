use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{AppState, WebError, auth::current_user, csrf, flash, templates::base_context};
use crate::constants::tags;
use crate::db::User;
use crate::services::{BookingError, BookingOutcome};

#[derive(Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    pub start_date_id: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// GET /
pub async fn index(
    State(state): State<Arc<AppState>>,
    session: Session,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, WebError> {
    let now = Utc::now();
    let home = state.booking_service().home(user.id, now).await?;

    let mut context = base_context(&session, Some(&user)).await?;
    context.insert("available_appointments", &home.available);
    context.insert("user_appointments", &home.mine);
    context.insert("now", &now.format(crate::models::appointment::START_FORMAT).to_string());
    state.templates.render("index.html", &context)
}

/// POST /booking/
pub async fn book(
    State(state): State<Arc<AppState>>,
    session: Session,
    Extension(user): Extension<User>,
    Form(form): Form<BookingForm>,
) -> Result<Redirect, WebError> {
    if !state.config().security.csrf_exempt_booking {
        csrf::verify(&session, &form.csrf_token).await?;
    }

    let Ok(appointment_id) = form.start_date_id.trim().parse::<i32>() else {
        flash::error(&session, tags::BOOKING, "Appointment not found.").await?;
        return Ok(Redirect::to("/"));
    };

    let result = state
        .booking_service()
        .book(appointment_id, user.id, Some(&form.note), Utc::now())
        .await;

    match result {
        Ok(BookingOutcome::Booked) => {
            flash::success(&session, tags::BOOKING, "Booking successful!").await?;
        }
        Ok(BookingOutcome::InPast) => {
            flash::error(&session, tags::BOOKING, "You cannot book a time in the past.").await?;
        }
        Ok(BookingOutcome::AlreadyBooked) => {
            flash::error(&session, tags::BOOKING, "This appointment is already booked.").await?;
        }
        Err(BookingError::NotFound(_)) => {
            flash::error(&session, tags::BOOKING, "Appointment not found.").await?;
        }
        Err(BookingError::Validation(e)) => {
            flash::error(&session, tags::BOOKING, e.to_string()).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/"))
}

/// GET /appointments/
pub async fn roster(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, WebError> {
    let user = current_user(&state, &session).await?;

    if state.config().security.restrict_roster_to_admin {
        match &user {
            None => return Ok(Redirect::to("/login/").into_response()),
            Some(u) if !u.is_admin => return Err(WebError::forbidden("Staff access required.")),
            Some(_) => {}
        }
    }

    let appointments = state.booking_service().roster(Utc::now()).await?;

    let mut context = base_context(&session, user.as_ref()).await?;
    context.insert("appointments", &appointments);
    Ok(state
        .templates
        .render("appointments.html", &context)?
        .into_response())
}
