use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SiteKeeperError {
    // Credential errors
    InvalidCredentials,

    // Session errors
    Unauthenticated,
    AuthError(String),

    // Authorization errors
    Forbidden,

    // Data errors
    NotFound(String),
    Conflict(String),
    ValidationError(String),

    // Storage errors
    StorageError(String),
    Unavailable(String),

    // Configuration errors
    ConfigError(String),
}

impl fmt::Display for SiteKeeperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid email or password"),
            Self::Unauthenticated => write!(f, "Authentication required"),
            Self::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            Self::Forbidden => write!(f, "Forbidden: insufficient permissions"),
            Self::NotFound(what) => write!(f, "Not found: {}", what),
            Self::Conflict(msg) => write!(f, "Conflict: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::StorageError(msg) => write!(f, "Storage error: {}", msg),
            Self::Unavailable(msg) => write!(f, "Service unavailable: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for SiteKeeperError {}

// Generic result type for sitekeeper
pub type Result<T> = std::result::Result<T, SiteKeeperError>;
