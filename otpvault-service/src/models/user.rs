//! User model - identity records with embedded authenticator entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One registered TOTP secret bound to a user. The secret field holds the
/// vault ciphertext blob, never the plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authenticator {
    pub id: Uuid,
    pub name: String,
    pub secret: String,
    pub issuer: Option<String>,
    pub account_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Authenticator {
    pub fn new(
        name: String,
        encrypted_secret: String,
        issuer: Option<String>,
        account_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            secret: encrypted_secret,
            issuer,
            account_name,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }
}

/// User entity. Authenticators are embedded; `two_factor_enabled` is kept in
/// lockstep with the set by the store's compound updates (true iff the set
/// is non-empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub two_factor_enabled: bool,
    pub authenticators: Vec<Authenticator>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            two_factor_enabled: false,
            authenticators: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Convert to sanitized response (no password hash, no ciphertext).
    pub fn sanitized(&self) -> UserView {
        UserView {
            id: self.id,
            email: self.email.clone(),
            two_factor_enabled: self.two_factor_enabled,
        }
    }
}

/// User response for the API (without sensitive fields).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    #[schema(example = "user@example.com")]
    pub email: String,
    pub two_factor_enabled: bool,
}

/// Authenticator metadata for the API (without the ciphertext blob).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthenticatorView {
    pub id: Uuid,
    #[schema(example = "GitHub")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<&Authenticator> for AuthenticatorView {
    fn from(a: &Authenticator) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            issuer: a.issuer.clone(),
            account_name: a.account_name.clone(),
            created_at: a.created_at,
            last_used_at: a.last_used_at,
        }
    }
}
