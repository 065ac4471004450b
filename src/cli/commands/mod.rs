mod appointment;
mod user;

pub use appointment::{cmd_appointment_add, cmd_appointment_list, parse_start};
pub use user::{cmd_user_add, cmd_user_list};
