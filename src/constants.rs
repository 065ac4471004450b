pub mod session {

    pub const USER_ID: &str = "user_id";

    pub const FLASH: &str = "flash";

    pub const CSRF_TOKEN: &str = "csrf_token";
}

/// Tags attached to flash messages, matched by the templates.
pub mod tags {

    pub const BOOKING: &str = "booking";

    pub const ANSWER: &str = "answer";

    pub const ANSWER_CHECK: &str = "answer_check";

    pub const PASSWORD: &str = "pswd";

    pub const PASSWORD_CHECK: &str = "pswd_check";

    pub const LOGIN: &str = "login";

    pub const ADMIN: &str = "admin";
}

pub mod limits {

    pub const MIN_ANSWER_LEN: usize = 4;

    pub const MIN_PASSWORD_LEN: usize = 8;

    pub const MAX_TEXT_LEN: usize = 200;
}

/// Credentials seeded by the initial migration.
pub mod defaults {

    pub const ADMIN_USERNAME: &str = "admin";

    pub const ADMIN_PASSWORD: &str = "password";
}
