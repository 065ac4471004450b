pub mod appointment;
pub mod question;
