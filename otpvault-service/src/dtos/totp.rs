use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{models::AuthenticatorView, utils::otpauth::ParsedOtpauth};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ImportAuthenticatorRequest {
    /// Base32 secret, as exported by the issuing service. Whitespace and
    /// case are tolerated here and canonicalized on import.
    #[validate(length(min = 1, message = "Secret is required"))]
    #[schema(example = "JBSWY3DPEHPK3PXP")]
    pub secret: String,

    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "GitHub")]
    pub name: String,

    #[schema(example = "GitHub")]
    pub issuer: Option<String>,

    #[schema(example = "user@example.com")]
    pub account_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportAuthenticatorResponse {
    #[schema(example = "Authenticator added successfully")]
    pub message: String,
    pub authenticator: AuthenticatorView,
}

/// An authenticator together with its code for the current window.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthenticatorCodeView {
    pub id: Uuid,
    pub name: String,
    pub issuer: Option<String>,
    pub account_name: Option<String>,
    #[schema(example = "287082")]
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListAuthenticatorsResponse {
    pub services: Vec<AuthenticatorCodeView>,
    /// Seconds until every listed code rolls over, shared across the set.
    #[schema(example = 17)]
    pub time_remaining: u64,
    #[schema(example = 30)]
    pub period: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CodeResponse {
    #[schema(example = "287082")]
    pub code: String,
    #[schema(example = 17)]
    pub time_remaining: u64,
    #[schema(example = 30)]
    pub period: u64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DisableRequest {
    #[validate(length(min = 6, message = "OTP code must be at least 6 digits"))]
    #[schema(example = "123456", min_length = 6)]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ParseUriRequest {
    #[validate(length(min = 1, message = "URI is required"))]
    #[schema(example = "otpauth://totp/GitHub:user@example.com?secret=JBSWY3DPEHPK3PXP&issuer=GitHub")]
    pub uri: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParseUriResponse {
    #[schema(example = "JBSWY3DPEHPK3PXP")]
    pub secret: String,
    pub issuer: Option<String>,
    pub account_name: Option<String>,
    /// Pre-fill value for the import form's name field.
    #[schema(example = "GitHub")]
    pub suggested_name: String,
}

impl From<ParsedOtpauth> for ParseUriResponse {
    fn from(p: ParsedOtpauth) -> Self {
        Self {
            secret: p.secret,
            issuer: p.issuer,
            account_name: p.account_name,
            suggested_name: p.suggested_name,
        }
    }
}
