use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;

use crate::services::{AuthError, BookingError, RecoveryError};

/// Failures a handler cannot turn into a flash message and redirect.
#[derive(Debug)]
pub enum WebError {
    NotFound(String),

    BadRequest(String),

    Forbidden(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for WebError {}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = format!(
            "<!doctype html><html><head><title>{code}</title></head>\
             <body><h1>{code}</h1><p>{text}</p><p><a href=\"/\">Home</a></p></body></html>",
            code = status,
            text = tera::escape_html(&message),
        );
        (status, Html(body)).into_response()
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<tera::Error> for WebError {
    fn from(err: tera::Error) -> Self {
        Self::InternalError(format!("Template error: {err:?}"))
    }
}

impl From<tower_sessions::session::Error> for WebError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::InternalError(format!("Session error: {err}"))
    }
}

impl From<BookingError> for WebError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(id) => Self::not_found("Appointment", id),
            BookingError::Validation(e) => Self::BadRequest(e.to_string()),
            BookingError::Database(msg) => Self::DatabaseError(msg),
            BookingError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<RecoveryError> for WebError {
    fn from(err: RecoveryError) -> Self {
        match err {
            RecoveryError::Database(msg) => Self::DatabaseError(msg),
            RecoveryError::Internal(msg) => Self::InternalError(msg),
            RecoveryError::QuestionNotFound(id) => Self::not_found("Question", id),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<AuthError> for WebError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
            AuthError::UserNotFound => Self::NotFound("User not found".to_string()),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl WebError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_hides_details() {
        let response = WebError::from(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_booking_error_mapping() {
        let err: WebError = BookingError::NotFound(7).into();
        assert!(matches!(err, WebError::NotFound(ref m) if m == "Appointment 7 not found"));
    }
}
