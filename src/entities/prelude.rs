pub use super::appointments::Entity as Appointments;
pub use super::password_reset_tokens::Entity as PasswordResetTokens;
pub use super::security_answers::Entity as SecurityAnswers;
pub use super::security_questions::Entity as SecurityQuestions;
pub use super::users::Entity as Users;
