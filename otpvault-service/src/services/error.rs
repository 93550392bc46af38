use thiserror::Error;

use crate::db::StoreError;
use crate::error::AppError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("An authenticator with this name already exists")]
    DuplicateAuthenticatorName,

    // Deliberately identical for unknown email and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid OTP code")]
    InvalidOtp,

    #[error("Two-factor authentication is not enabled")]
    TwoFactorNotEnabled,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Authenticator not found")]
    AuthenticatorNotFound,

    #[error("Invalid secret: {0}")]
    InvalidSecret(String),

    #[error("Secret decryption failed")]
    Decryption,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::UserNotFound,
            StoreError::Duplicate => ServiceError::EmailAlreadyRegistered,
            StoreError::Backend(e) => ServiceError::Internal(e),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::DuplicateAuthenticatorName => AppError::Conflict(anyhow::anyhow!(
                "An authenticator with this name already exists"
            )),
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::InvalidOtp => AppError::Unauthorized(anyhow::anyhow!("Invalid OTP code")),
            ServiceError::TwoFactorNotEnabled => AppError::Unauthorized(anyhow::anyhow!(
                "Two-factor authentication is not enabled"
            )),
            ServiceError::InvalidToken => AppError::Unauthorized(anyhow::anyhow!("Invalid token")),
            ServiceError::TokenExpired => AppError::Unauthorized(anyhow::anyhow!("Token expired")),
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::AuthenticatorNotFound => {
                AppError::NotFound(anyhow::anyhow!("Authenticator not found"))
            }
            ServiceError::InvalidSecret(e) => {
                AppError::BadRequest(anyhow::anyhow!("Invalid secret: {}", e))
            }
            // Tampered ciphertext is fatal to the request, never degraded.
            ServiceError::Decryption => {
                AppError::InternalError(anyhow::anyhow!("Secret decryption failed"))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
