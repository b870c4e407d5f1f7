//! Server configuration module
//! Handles dynamic configuration parameters for the content management backend

use crate::constants::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TOKEN_TTL_SECS};
use crate::error::{Result, SiteKeeperError};
use std::env;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Secret used to sign and validate session tokens
    pub token_secret: String,
    /// Lifetime of issued session tokens, in seconds
    pub token_ttl_secs: u64,
    /// Mark session cookies as Secure (HTTPS only)
    pub secure_cookies: bool,
    /// Development mode (relaxes cookie security for local work)
    pub development_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        panic!("ServerConfig::default() is not allowed for security reasons. Use ServerConfig::from_env() instead.");
    }
}

impl ServerConfig {
    /// Create a test configuration - DANGEROUS: Only for testing!
    pub fn for_testing() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            token_secret: "unit-and-integration-only-signing-key-0123456789".to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            secure_cookies: false,
            development_mode: true,
        }
    }

    /// Validate that the signing secret meets security requirements
    fn validate_token_secret(secret: &str) -> Result<()> {
        if secret.len() < 32 {
            return Err(SiteKeeperError::ConfigError(
                "Token secret must be at least 32 characters long".to_string(),
            ));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "SECRET_KEY",
            "your-secret-key",
            "change-this",
            "placeholder",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.contains(pattern) {
                return Err(SiteKeeperError::ConfigError(format!(
                    "Token secret contains insecure pattern '{}'. Please use a secure random secret generated with: openssl rand -base64 32",
                    pattern
                )));
            }
        }

        // Ensure some complexity
        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SiteKeeperError::ConfigError(
                "Token secret should contain mixed characters (letters, numbers, symbols) for security".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let host = env::var("SITEKEEPER_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = env::var("SITEKEEPER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let token_secret = env::var("SITEKEEPER_TOKEN_SECRET")
            .or_else(|_| env::var("TOKEN_SECRET"))
            .map_err(|_| {
                SiteKeeperError::ConfigError(
                    "TOKEN_SECRET environment variable is required for security. \
                     Generate one with: openssl rand -base64 32"
                        .to_string(),
                )
            })?;

        let token_ttl_secs = env::var("SITEKEEPER_TOKEN_TTL_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        if token_ttl_secs == 0 {
            return Err(SiteKeeperError::ConfigError(
                "SITEKEEPER_TOKEN_TTL_SECS must be greater than zero".to_string(),
            ));
        }

        let development_mode = env::var("SITEKEEPER_DEVELOPMENT_MODE")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false); // SECURITY: Default to false (production mode)

        let secure_cookies = env::var("SITEKEEPER_SECURE_COOKIES")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(!development_mode);

        // A placeholder signing key is a fatal startup error, never a runtime default
        Self::validate_token_secret(&token_secret)?;

        Ok(Self {
            host,
            port,
            token_secret,
            token_ttl_secs,
            secure_cookies,
            development_mode,
        })
    }
}
