// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const API_PATH: &str = "api";

// Session token configuration constants
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400;
pub const SESSION_COOKIE: &str = "sitekeeper_session";
pub const MAX_TOKEN_LENGTH: usize = 1000;

// Account configuration constants
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NAME_LENGTH: usize = 100;
