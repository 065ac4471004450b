pub mod prelude;

pub mod appointments;
pub mod password_reset_tokens;
pub mod security_answers;
pub mod security_questions;
pub mod users;
