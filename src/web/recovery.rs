use axum::{
    Extension, Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{AppState, WebError, auth::current_user, csrf, flash, templates::base_context};
use crate::constants::tags;
use crate::db::User;
use crate::services::{RecoveryError, ResetRequest};

#[derive(Deserialize)]
pub struct AnswerForm {
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct ChallengeForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct ResetQuery {
    pub username: Option<String>,
    pub token: Option<String>,
}

/// Context shared by the question and forgot pages.
async fn question_context(
    state: &AppState,
    session: &Session,
    user: Option<&User>,
) -> Result<tera::Context, WebError> {
    let recovery = state.recovery_service();
    let questions = recovery.list_questions().await?;
    let prev_answer = match user {
        Some(user) => recovery.prior_answer(user.id).await?,
        None => None,
    };

    let mut context = base_context(session, user).await?;
    context.insert("questions", &questions);
    context.insert("prev_answer", &prev_answer);
    Ok(context)
}

fn render_reset_form(
    state: &AppState,
    mut context: tera::Context,
    username: Option<&str>,
    token: Option<&str>,
) -> Result<Response, WebError> {
    context.insert("username", &username);
    context.insert("token", &token);
    Ok(state
        .templates
        .render("changepswd.html", &context)?
        .into_response())
}

/// GET /question/
pub async fn question_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, WebError> {
    let context = question_context(&state, &session, Some(&user)).await?;
    state.templates.render("question.html", &context)
}

/// POST /question/
pub async fn save_answer(
    State(state): State<Arc<AppState>>,
    session: Session,
    Extension(user): Extension<User>,
    Form(form): Form<AnswerForm>,
) -> Result<Redirect, WebError> {
    csrf::verify(&session, &form.csrf_token).await?;

    let Ok(question_id) = form.question_id.trim().parse::<i32>() else {
        flash::error(&session, tags::ANSWER_CHECK, "Please choose a valid question.").await?;
        return Ok(Redirect::to("/question/"));
    };

    let result = state
        .recovery_service()
        .save_answer(user.id, question_id, &form.answer, Utc::now())
        .await;

    match result {
        Ok(()) => {
            flash::success(&session, tags::ANSWER, "Recovery question saved successfully!").await?;
            Ok(Redirect::to("/"))
        }
        Err(RecoveryError::Validation(e)) => {
            flash::error(&session, tags::ANSWER_CHECK, e.to_string()).await?;
            Ok(Redirect::to("/question/"))
        }
        Err(RecoveryError::QuestionNotFound(_)) => {
            flash::error(&session, tags::ANSWER_CHECK, "Please choose a valid question.").await?;
            Ok(Redirect::to("/question/"))
        }
        Err(e @ RecoveryError::Conflict) => {
            flash::error(&session, tags::ANSWER, e.to_string()).await?;
            Ok(Redirect::to("/"))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /forgot/
pub async fn forgot_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<impl IntoResponse, WebError> {
    let user = current_user(&state, &session).await?;
    let context = question_context(&state, &session, user.as_ref()).await?;
    state.templates.render("forgot.html", &context)
}

/// POST /forgot/
///
/// A passed challenge renders the reset form directly, carrying the username
/// and, when tokens are required, the freshly issued reset token.
pub async fn forgot(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<ChallengeForm>,
) -> Result<Response, WebError> {
    csrf::verify(&session, &form.csrf_token).await?;

    let result = match form.question_id.trim().parse::<i32>() {
        Ok(question_id) => {
            state
                .recovery_service()
                .challenge(&form.username, question_id, &form.answer, Utc::now())
                .await
        }
        Err(_) => Err(RecoveryError::ChallengeFailed),
    };

    match result {
        Ok(pass) => {
            flash::success(
                &session,
                tags::ANSWER_CHECK,
                "Recovery question was answered correctly!",
            )
            .await?;
            let user = current_user(&state, &session).await?;
            let context = base_context(&session, user.as_ref()).await?;
            render_reset_form(&state, context, Some(&pass.username), pass.token.as_deref())
        }
        Err(e @ (RecoveryError::Validation(_) | RecoveryError::ChallengeFailed)) => {
            flash::error(&session, tags::ANSWER_CHECK, e.to_string()).await?;
            Ok(Redirect::to("/forgot/").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /changepswd/
pub async fn changepswd_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ResetQuery>,
) -> Result<Response, WebError> {
    let user = current_user(&state, &session).await?;
    let context = base_context(&session, user.as_ref()).await?;
    render_reset_form(
        &state,
        context,
        query.username.as_deref(),
        query.token.as_deref(),
    )
}

/// POST /changepswd/
pub async fn changepswd(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<ResetForm>,
) -> Result<Response, WebError> {
    csrf::verify(&session, &form.csrf_token).await?;

    let request = ResetRequest {
        username: &form.username,
        password1: &form.password1,
        password2: &form.password2,
        token: Some(form.token.as_str()),
    };

    match state
        .recovery_service()
        .reset_password(request, Utc::now())
        .await
    {
        Ok(()) => {
            flash::success(&session, tags::PASSWORD, "Password updated successfully!").await?;
            Ok(Redirect::to("/").into_response())
        }
        Err(RecoveryError::Policy(message)) => {
            flash::error(&session, tags::PASSWORD_CHECK, message).await?;
            let user = current_user(&state, &session).await?;
            let context = base_context(&session, user.as_ref()).await?;
            render_reset_form(
                &state,
                context,
                Some(&form.username),
                Some(form.token.as_str()).filter(|t| !t.is_empty()),
            )
        }
        Err(e @ RecoveryError::UnknownUser) => {
            flash::error(&session, tags::PASSWORD_CHECK, e.to_string()).await?;
            Ok(Redirect::to("/changepswd/").into_response())
        }
        Err(e @ RecoveryError::InvalidToken) => {
            flash::error(&session, tags::ANSWER_CHECK, e.to_string()).await?;
            Ok(Redirect::to("/forgot/").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
