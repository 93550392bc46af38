//! Services layer: the credential issuance and TOTP lifecycle engine.

pub mod auth;
pub mod authenticator;
pub mod error;
mod token;
mod totp;
mod vault;

pub use auth::AuthService;
pub use authenticator::AuthenticatorService;
pub use error::ServiceError;
pub use token::{TokenClaims, TokenKind, TokenService};
pub use totp::TotpEngine;
pub use vault::SecretVault;
