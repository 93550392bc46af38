pub mod auth;
pub mod totp;
