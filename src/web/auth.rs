use axum::{
    Extension, Form,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{AppState, WebError, csrf, flash, templates::base_context};
use crate::constants::{session::USER_ID, tags};
use crate::db::User;
use crate::services::AuthError;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfForm {
    #[serde(default)]
    pub csrf_token: String,
}

// ============================================================================
// Session helpers
// ============================================================================

/// Resolves the session's user. A session pointing at a deleted user counts
/// as anonymous.
pub async fn current_user(state: &AppState, session: &Session) -> Result<Option<User>, WebError> {
    let Some(user_id) = session.get::<i32>(USER_ID).await? else {
        return Ok(None);
    };

    match state.auth_service().get_user(user_id).await {
        Ok(user) => Ok(Some(user)),
        Err(AuthError::UserNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Redirects anonymous visitors to the login page and hands the signed-in
/// [`User`] to the handler as an extension.
pub async fn require_login(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let Some(user) = current_user(&state, &session).await? else {
        return Ok(Redirect::to("/login/").into_response());
    };

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Staff-only gate. Anonymous visitors go to the login page, everyone else
/// without the admin flag gets a 403.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let Some(user) = current_user(&state, &session).await? else {
        return Ok(Redirect::to("/login/").into_response());
    };

    if !user.is_admin {
        tracing::warn!(user_id = user.id, path = %request.uri().path(), "Staff area refused");
        return Err(WebError::forbidden("Staff access required."));
    }

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /login/
pub async fn login_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<impl IntoResponse, WebError> {
    let user = current_user(&state, &session).await?;
    let context = base_context(&session, user.as_ref()).await?;
    state.templates.render("login.html", &context)
}

/// POST /login/
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, WebError> {
    csrf::verify(&session, &form.csrf_token).await?;

    match state
        .auth_service()
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            session.cycle_id().await?;
            csrf::rotate(&session).await?;
            session.insert(USER_ID, user.id).await?;
            tracing::info!(user_id = user.id, "User logged in");
            Ok(Redirect::to("/"))
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Failed login attempt");
            flash::error(&session, tags::LOGIN, "Invalid username or password.").await?;
            Ok(Redirect::to("/login/"))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /logout/
pub async fn logout(
    session: Session,
    Extension(user): Extension<User>,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, WebError> {
    csrf::verify(&session, &form.csrf_token).await?;
    session.flush().await?;
    tracing::info!(user_id = user.id, "User logged out");
    Ok(Redirect::to("/login/"))
}
