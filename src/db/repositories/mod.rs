pub mod appointment;
pub mod question;
pub mod reset_token;
pub mod user;
