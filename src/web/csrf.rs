//! Per-session synchronizer tokens for form posts.

use tower_sessions::Session;

use super::WebError;
use crate::constants::session::CSRF_TOKEN;
use crate::db::repositories::user::generate_token;

/// Returns the session token, creating it on first use.
pub async fn token(session: &Session) -> Result<String, WebError> {
    if let Some(existing) = session.get::<String>(CSRF_TOKEN).await? {
        return Ok(existing);
    }

    let fresh = generate_token();
    session.insert(CSRF_TOKEN, &fresh).await?;
    Ok(fresh)
}

/// Drops the current token; the next form render mints a new one.
pub async fn rotate(session: &Session) -> Result<(), WebError> {
    session.remove::<String>(CSRF_TOKEN).await?;
    Ok(())
}

pub async fn verify(session: &Session, submitted: &str) -> Result<(), WebError> {
    let expected = session.get::<String>(CSRF_TOKEN).await?;

    match expected {
        Some(expected) if !submitted.is_empty() && constant_time_eq(&expected, submitted) => Ok(()),
        _ => {
            tracing::warn!("Rejected form post with missing or wrong CSRF token");
            Err(WebError::forbidden("CSRF verification failed."))
        }
    }
}

/// Compares SHA-256 digests so neither the content nor the length leaks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    use sha2::{Digest, Sha256};
    use subtle::ConstantTimeEq;

    let hash_a = Sha256::digest(a.as_bytes());
    let hash_b = Sha256::digest(b.as_bytes());
    hash_a.ct_eq(&hash_b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
    }
}
