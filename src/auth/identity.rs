use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account roles within the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Client,
}

impl Role {
    /// Admins may read and mutate resources under any domain
    pub fn manages_all_domains(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Client
    }
}

/// Represents a registered account
#[derive(Debug, Clone)]
pub struct Identity {
    /// Unique account identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Login email, unique across the platform
    pub email: String,
    /// One-way argon2 hash of the account password. Never serialized
    /// outward and never returned by any handler.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Creates a new identity with a freshly generated id
    pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }
}
