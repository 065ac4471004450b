//! One-shot messages carried in the session to the next rendered page.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::WebError;
use crate::constants::session::FLASH;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlashMessage {
    pub level: Level,
    pub tag: String,
    pub text: String,
}

pub async fn push(
    session: &Session,
    level: Level,
    tag: &str,
    text: impl Into<String>,
) -> Result<(), WebError> {
    let mut queued: Vec<FlashMessage> = session.get(FLASH).await?.unwrap_or_default();
    queued.push(FlashMessage {
        level,
        tag: tag.to_string(),
        text: text.into(),
    });
    session.insert(FLASH, queued).await?;
    Ok(())
}

pub async fn success(session: &Session, tag: &str, text: impl Into<String>) -> Result<(), WebError> {
    push(session, Level::Success, tag, text).await
}

pub async fn error(session: &Session, tag: &str, text: impl Into<String>) -> Result<(), WebError> {
    push(session, Level::Error, tag, text).await
}

/// Drains the queue. Each message is shown once.
pub async fn take(session: &Session) -> Result<Vec<FlashMessage>, WebError> {
    Ok(session
        .remove::<Vec<FlashMessage>>(FLASH)
        .await?
        .unwrap_or_default())
}
