//! Login/registration state machine.
//!
//! Anonymous -> password verified -> either fully authenticated (no 2FA) or
//! OTP pending with a temporary token. `verify_otp` is the only path that
//! upgrades a temporary token to a full one.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{CredentialStore, StoreError},
    dtos::auth::{LoginResponse, RegisterResponse, VerifyOtpResponse},
    models::User,
    services::{SecretVault, ServiceError, TokenKind, TokenService, TotpEngine},
    utils::{hash_password, verify_password},
};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
    vault: SecretVault,
    totp: TotpEngine,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenService,
        vault: SecretVault,
        totp: TotpEngine,
    ) -> Self {
        Self {
            store,
            tokens,
            vault,
            totp,
        }
    }

    pub async fn register(
        &self,
        email: String,
        password: String,
    ) -> Result<RegisterResponse, ServiceError> {
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let password_hash = hash_password(&password).map_err(ServiceError::Internal)?;

        let user = User::new(email, password_hash);
        let view = user.sanitized();

        // The email index may have been taken between the lookup and here.
        self.store.insert_user(user).await.map_err(|e| match e {
            StoreError::Duplicate => ServiceError::EmailAlreadyRegistered,
            other => other.into(),
        })?;

        tracing::info!(user_id = %view.id, "User registered");

        Ok(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: view,
        })
    }

    pub async fn login(
        &self,
        email: String,
        password: String,
    ) -> Result<LoginResponse, ServiceError> {
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(&password, &user.password_hash)
            .map_err(|_| ServiceError::InvalidCredentials)?;

        // With 2FA enabled the caller gets a short-lived temporary token and
        // must come back through verify_otp; never a full token here.
        if user.two_factor_enabled {
            let token = self
                .tokens
                .issue(user.id, &user.email, TokenKind::Temporary)?;

            tracing::info!(user_id = %user.id, "Password verified, OTP pending");

            return Ok(LoginResponse {
                token,
                requires_2fa: true,
                user: user.sanitized(),
            });
        }

        let token = self.tokens.issue(user.id, &user.email, TokenKind::Full)?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            token,
            requires_2fa: false,
            user: user.sanitized(),
        })
    }

    /// Complete the second factor. The caller's identity comes from an
    /// already-verified temporary token; the middleware owns that boundary.
    pub async fn verify_otp(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<VerifyOtpResponse, ServiceError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .filter(|u| u.two_factor_enabled)
            .ok_or(ServiceError::TwoFactorNotEnabled)?;

        let matched = find_matching_authenticator(&self.vault, &self.totp, &user, code)?
            .ok_or(ServiceError::InvalidOtp)?;

        self.store.touch_last_used(user.id, matched).await?;

        let token = self.tokens.issue(user.id, &user.email, TokenKind::Full)?;

        tracing::info!(user_id = %user.id, authenticator_id = %matched, "OTP verified");

        Ok(VerifyOtpResponse {
            token,
            user: user.sanitized(),
        })
    }
}

/// Check a code against every registered authenticator; first match wins.
/// Order only decides whose last-used timestamp the caller should stamp,
/// never the accept/reject outcome. Shared by OTP login verification and
/// the OTP-gated disable flow.
pub(crate) fn find_matching_authenticator(
    vault: &SecretVault,
    totp: &TotpEngine,
    user: &User,
    code: &str,
) -> Result<Option<Uuid>, ServiceError> {
    for authenticator in &user.authenticators {
        let secret = vault.decrypt(&authenticator.secret)?;
        if totp.check(code, &secret)? {
            return Ok(Some(authenticator.id));
        }
    }
    Ok(None)
}
