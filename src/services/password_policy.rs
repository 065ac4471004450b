//! Pluggable password rules for the reset form.
//!
//! A [`PasswordPolicy`] is an ordered list of predicates. The first failing
//! rule's message is reported back to the user.

use crate::config::SecurityConfig;
use crate::constants::limits::MIN_PASSWORD_LEN;

const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Inputs of the reset form a rule can look at.
#[derive(Debug, Clone, Copy)]
pub struct PasswordCandidate<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub confirmation: &'a str,
}

type Predicate = Box<dyn Fn(&PasswordCandidate<'_>) -> bool + Send + Sync>;

pub struct PasswordRule {
    message: &'static str,
    predicate: Predicate,
}

impl PasswordRule {
    pub fn new(
        message: &'static str,
        predicate: impl Fn(&PasswordCandidate<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            message,
            predicate: Box::new(predicate),
        }
    }

    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.message
    }

    #[must_use]
    pub fn passes(&self, candidate: &PasswordCandidate<'_>) -> bool {
        (self.predicate)(candidate)
    }
}

impl std::fmt::Debug for PasswordRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordRule")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct PasswordPolicy {
    rules: Vec<PasswordRule>,
}

impl PasswordPolicy {
    /// Confirmation must match and the password must be long enough.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            rules: vec![
                PasswordRule::new("Passwords do not match!", |c| c.password == c.confirmation),
                PasswordRule::new("Password must be at least 8 characters long.", |c| {
                    c.password.chars().count() >= MIN_PASSWORD_LEN
                }),
            ],
        }
    }

    /// Lenient rules plus username, digit, case and special-character checks.
    #[must_use]
    pub fn strict() -> Self {
        Self::lenient()
            .with_rule(PasswordRule::new(
                "Username and password should not match!",
                |c| c.username != c.password,
            ))
            .with_rule(PasswordRule::new(
                "Password must contain at least one number.",
                |c| c.password.chars().any(|ch| ch.is_ascii_digit()),
            ))
            .with_rule(PasswordRule::new(
                "Password must contain at least one uppercase letter.",
                |c| c.password.chars().any(|ch| ch.is_ascii_uppercase()),
            ))
            .with_rule(PasswordRule::new(
                "Password must contain at least one lowercase letter.",
                |c| c.password.chars().any(|ch| ch.is_ascii_lowercase()),
            ))
            .with_rule(PasswordRule::new(
                "Password must contain at least one special character.",
                |c| c.password.chars().any(|ch| SPECIAL_CHARACTERS.contains(ch)),
            ))
    }

    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        if config.strict_password_policy {
            Self::strict()
        } else {
            Self::lenient()
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: PasswordRule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the message of the first rule the candidate breaks.
    pub fn check(&self, candidate: &PasswordCandidate<'_>) -> Result<(), &'static str> {
        self.rules
            .iter()
            .find(|rule| !rule.passes(candidate))
            .map_or(Ok(()), |rule| Err(rule.message()))
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::lenient()
    }
}
