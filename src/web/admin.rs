//! Back-office screen for staff: appointment roster with create/delete,
//! plus read-only tables of users, questions and saved answers.

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{AppState, WebError, auth::CsrfForm, csrf, flash, templates::base_context};
use crate::constants::tags;
use crate::db::User;
use crate::services::BookingError;

/// Format produced by `<input type="datetime-local">`.
const FORM_START_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Deserialize)]
pub struct NewAppointmentForm {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Serialize)]
struct AnswerRow {
    username: String,
    question: String,
    saved_date: String,
}

/// GET /admin/
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    session: Session,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, WebError> {
    let appointments = state.booking_service().roster(Utc::now()).await?;
    let questions = state.recovery_service().list_questions().await?;
    let users = state.store().list_users().await?;

    let answers: Vec<AnswerRow> = state
        .store()
        .list_answers()
        .await?
        .into_iter()
        .map(|(answer, owner)| AnswerRow {
            username: owner.map(|u| u.username).unwrap_or_default(),
            question: answer
                .question_id
                .and_then(|id| questions.iter().find(|q| q.id == id))
                .map_or_else(|| "-".to_string(), |q| q.text.clone()),
            saved_date: answer
                .saved_date
                .format(crate::models::appointment::START_FORMAT)
                .to_string(),
        })
        .collect();

    let mut context = base_context(&session, Some(&user)).await?;
    context.insert("appointments", &appointments);
    context.insert("questions", &questions);
    context.insert("answers", &answers);
    context.insert("users", &users);
    state.templates.render("admin.html", &context)
}

/// POST /admin/appointments/
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<NewAppointmentForm>,
) -> Result<Redirect, WebError> {
    csrf::verify(&session, &form.csrf_token).await?;

    let Ok(start) = NaiveDateTime::parse_from_str(form.start_date.trim(), FORM_START_FORMAT) else {
        flash::error(&session, tags::ADMIN, "Invalid start date.").await?;
        return Ok(Redirect::to("/admin/"));
    };

    let created = state
        .booking_service()
        .create_appointment(start.and_utc())
        .await?;

    flash::success(
        &session,
        tags::ADMIN,
        format!("Appointment created: {}", created.summary),
    )
    .await?;
    Ok(Redirect::to("/admin/"))
}

/// POST /admin/appointments/{id}/delete/
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, WebError> {
    csrf::verify(&session, &form.csrf_token).await?;

    match state.booking_service().delete_appointment(id).await {
        Ok(()) => flash::success(&session, tags::ADMIN, "Appointment deleted.").await?,
        Err(BookingError::NotFound(_)) => {
            flash::error(&session, tags::ADMIN, "Appointment not found.").await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/admin/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_start_format() {
        let parsed = NaiveDateTime::parse_from_str("2030-05-01T09:30", FORM_START_FORMAT).unwrap();
        assert_eq!(
            parsed.and_utc().to_rfc3339(),
            "2030-05-01T09:30:00+00:00"
        );
        assert!(NaiveDateTime::parse_from_str("tomorrow", FORM_START_FORMAT).is_err());
    }
}
