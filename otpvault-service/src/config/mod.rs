use serde::Deserialize;
use std::env;

use crate::error::AppError;

/// Default signing secret inherited by dev environments when TOKEN_SECRET is
/// unset. A deployment footgun on purpose: production refuses to boot
/// without an explicit value, dev boots with it and logs a warning.
pub const DEV_TOKEN_SECRET: &str = "default-secret-change-in-production";

/// Dev-only vault key (32 zero bytes, hex). Same rules as the token secret.
pub const DEV_VAULT_KEY: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Debug, Clone, Deserialize)]
pub struct OtpVaultConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    pub token: TokenConfig,
    pub vault: VaultConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Shared HMAC secret for capability token signatures.
    pub secret: String,
    /// Lifetime of the temporary (password-verified, OTP-pending) token.
    pub temp_token_expiry_minutes: i64,
    /// Lifetime of the full access token.
    pub full_token_expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Hex-encoded 32-byte key protecting TOTP secrets at rest.
    pub encryption_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl OtpVaultConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = OtpVaultConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("otpvault-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            token: TokenConfig {
                secret: get_env("TOKEN_SECRET", Some(DEV_TOKEN_SECRET), is_prod)?,
                temp_token_expiry_minutes: get_env(
                    "TOKEN_TEMP_EXPIRY_MINUTES",
                    Some("5"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
                full_token_expiry_days: get_env("TOKEN_FULL_EXPIRY_DAYS", Some("7"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
            vault: VaultConfig {
                encryption_key: get_env("VAULT_ENCRYPTION_KEY", Some(DEV_VAULT_KEY), is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env(
                    "ALLOWED_ORIGINS",
                    Some("http://localhost:3000"),
                    is_prod,
                )?
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.token.temp_token_expiry_minutes <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TOKEN_TEMP_EXPIRY_MINUTES must be positive"
            )));
        }

        if self.token.full_token_expiry_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "TOKEN_FULL_EXPIRY_DAYS must be positive"
            )));
        }

        let key_bytes = hex::decode(&self.vault.encryption_key)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("VAULT_ENCRYPTION_KEY: {}", e)))?;
        if key_bytes.len() != 32 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "VAULT_ENCRYPTION_KEY must be 32 bytes (64 hex characters)"
            )));
        }

        if self.token.secret == DEV_TOKEN_SECRET {
            tracing::warn!(
                "TOKEN_SECRET is the well-known development default; override it before deploying"
            );
        }
        if self.vault.encryption_key == DEV_VAULT_KEY {
            tracing::warn!(
                "VAULT_ENCRYPTION_KEY is the well-known development default; override it before deploying"
            );
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
