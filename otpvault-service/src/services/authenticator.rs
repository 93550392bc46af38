//! Authenticator lifecycle: import, listing with live codes, removal and
//! the OTP-gated disable-everything operation.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{CredentialStore, StoreError},
    dtos::totp::{
        AuthenticatorCodeView, CodeResponse, ImportAuthenticatorRequest,
        ImportAuthenticatorResponse, ListAuthenticatorsResponse,
    },
    models::{Authenticator, AuthenticatorView, User},
    services::{auth::find_matching_authenticator, SecretVault, ServiceError, TotpEngine},
};

#[derive(Clone)]
pub struct AuthenticatorService {
    store: Arc<dyn CredentialStore>,
    vault: SecretVault,
    totp: TotpEngine,
}

impl AuthenticatorService {
    pub fn new(store: Arc<dyn CredentialStore>, vault: SecretVault, totp: TotpEngine) -> Self {
        Self { store, vault, totp }
    }

    /// Register a new authenticator from an externally provided secret.
    /// The secret is normalized exactly once, here, before encryption.
    pub async fn import(
        &self,
        user_id: Uuid,
        req: ImportAuthenticatorRequest,
    ) -> Result<ImportAuthenticatorResponse, ServiceError> {
        let canonical = TotpEngine::normalize_secret(&req.secret)?;
        // Reject secrets the engine could never generate from.
        self.totp.generate_at(&canonical, 0)?;

        let encrypted = self.vault.encrypt(&canonical)?;
        let authenticator = Authenticator::new(req.name, encrypted, req.issuer, req.account_name);
        let view = AuthenticatorView::from(&authenticator);

        // Name uniqueness lives in the store's atomic update, so concurrent
        // imports of the same name cannot both land.
        self.store
            .add_authenticator(user_id, authenticator)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => ServiceError::DuplicateAuthenticatorName,
                StoreError::NotFound => ServiceError::UserNotFound,
                other => other.into(),
            })?;

        tracing::info!(user_id = %user_id, authenticator_id = %view.id, "Authenticator added");

        Ok(ImportAuthenticatorResponse {
            message: "Authenticator added successfully".to_string(),
            authenticator: view,
        })
    }

    /// Current codes for every authenticator, plus one shared countdown so
    /// the displayed codes roll over in lockstep. The bulk listing never
    /// touches last-used; only the single-code fetch does.
    pub async fn list_with_codes(
        &self,
        user_id: Uuid,
    ) -> Result<ListAuthenticatorsResponse, ServiceError> {
        let user = self.require_user(user_id).await?;

        let mut services = Vec::with_capacity(user.authenticators.len());
        for authenticator in &user.authenticators {
            let secret = self.vault.decrypt(&authenticator.secret)?;
            let code = self.totp.generate(&secret)?;
            services.push(AuthenticatorCodeView {
                id: authenticator.id,
                name: authenticator.name.clone(),
                issuer: authenticator.issuer.clone(),
                account_name: authenticator.account_name.clone(),
                code,
                created_at: authenticator.created_at,
                last_used_at: authenticator.last_used_at,
            });
        }

        Ok(ListAuthenticatorsResponse {
            services,
            time_remaining: self.totp.time_remaining(),
            period: self.totp.period(),
        })
    }

    /// Current code for one authenticator. Unlike the bulk listing this
    /// stamps last-used: fetching a single service's code is "using" it.
    pub async fn code_for(
        &self,
        user_id: Uuid,
        authenticator_id: Uuid,
    ) -> Result<CodeResponse, ServiceError> {
        let user = self.require_user(user_id).await?;

        let authenticator = user
            .authenticators
            .iter()
            .find(|a| a.id == authenticator_id)
            .ok_or(ServiceError::AuthenticatorNotFound)?;

        let secret = self.vault.decrypt(&authenticator.secret)?;
        let code = self.totp.generate(&secret)?;

        self.store.touch_last_used(user_id, authenticator_id).await?;

        Ok(CodeResponse {
            code,
            time_remaining: self.totp.time_remaining(),
            period: self.totp.period(),
        })
    }

    pub async fn remove(
        &self,
        user_id: Uuid,
        authenticator_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.require_user(user_id).await?;

        // If this was the last authenticator the store clears the enabled
        // flag inside the same update.
        self.store
            .remove_authenticator(user_id, authenticator_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => ServiceError::AuthenticatorNotFound,
                other => other.into(),
            })?;

        tracing::info!(user_id = %user_id, authenticator_id = %authenticator_id, "Authenticator removed");

        Ok(())
    }

    /// Disable 2FA outright: a single all-or-nothing clear of the flag and
    /// the whole authenticator set, gated on a currently valid code.
    pub async fn disable(&self, user_id: Uuid, code: &str) -> Result<(), ServiceError> {
        let user = self.require_user(user_id).await?;

        if !user.two_factor_enabled {
            return Err(ServiceError::TwoFactorNotEnabled);
        }

        find_matching_authenticator(&self.vault, &self.totp, &user, code)?
            .ok_or(ServiceError::InvalidOtp)?;

        self.store.disable_two_factor(user_id).await?;

        tracing::info!(user_id = %user_id, "Two-factor authentication disabled");

        Ok(())
    }

    async fn require_user(&self, user_id: Uuid) -> Result<User, ServiceError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }
}
