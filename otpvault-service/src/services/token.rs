//! Capability token issuance and verification.
//!
//! Two token classes exist: `Temporary` asserts "password verified, OTP
//! pending" and lives minutes; `Full` asserts complete authentication and
//! lives days. The class is carried as a claim and re-checked explicitly at
//! every verification site, so a valid signature alone never lets one class
//! stand in for the other.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::services::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived: password checked, OTP verification still owed.
    Temporary,
    /// Long-lived: fully authenticated.
    Full,
}

/// Signed claims. `temp` is omitted on the wire for full tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Email
    pub email: String,
    /// Set on temporary tokens only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub temp: bool,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl TokenClaims {
    pub fn kind(&self) -> TokenKind {
        if self.temp {
            TokenKind::Temporary
        } else {
            TokenKind::Full
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    temp_token_expiry_minutes: i64,
    full_token_expiry_days: i64,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            temp_token_expiry_minutes: config.temp_token_expiry_minutes,
            full_token_expiry_days: config.full_token_expiry_days,
        }
    }

    /// Sign a token of the given class for a user.
    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        kind: TokenKind,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = match kind {
            TokenKind::Temporary => now + Duration::minutes(self.temp_token_expiry_minutes),
            TokenKind::Full => now + Duration::days(self.full_token_expiry_days),
        };

        let claims = TokenClaims {
            sub: user_id,
            email: email.to_string(),
            temp: kind == TokenKind::Temporary,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Token encoding failed: {}", e)))?;

        Ok(token)
    }

    /// Verify signature and expiry, then check the token class. A full token
    /// where a temporary one is expected (or vice versa) is rejected even
    /// with a valid signature.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, ServiceError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::TokenExpired,
                _ => ServiceError::InvalidToken,
            }
        })?;

        if data.claims.kind() != expected {
            return Err(ServiceError::InvalidToken);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        TokenService::new(&TokenConfig {
            secret: "test-secret".to_string(),
            temp_token_expiry_minutes: 5,
            full_token_expiry_days: 7,
        })
    }

    #[test]
    fn test_full_token_roundtrip() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service
            .issue(user_id, "test@example.com", TokenKind::Full)
            .unwrap();
        assert!(!token.is_empty());

        let claims = service.verify(&token, TokenKind::Full).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.kind(), TokenKind::Full);
    }

    #[test]
    fn test_temporary_token_roundtrip() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service
            .issue(user_id, "test@example.com", TokenKind::Temporary)
            .unwrap();

        let claims = service.verify(&token, TokenKind::Temporary).unwrap();
        assert_eq!(claims.kind(), TokenKind::Temporary);
        // Lifetime is minutes, not days.
        assert!(claims.exp - claims.iat <= 5 * 60);
    }

    #[test]
    fn test_wrong_class_rejected_despite_valid_signature() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let temp = service
            .issue(user_id, "test@example.com", TokenKind::Temporary)
            .unwrap();
        let full = service
            .issue(user_id, "test@example.com", TokenKind::Full)
            .unwrap();

        assert!(matches!(
            service.verify(&temp, TokenKind::Full),
            Err(ServiceError::InvalidToken)
        ));
        assert!(matches!(
            service.verify(&full, TokenKind::Temporary),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let service = test_service();
        let other = TokenService::new(&TokenConfig {
            secret: "another-secret".to_string(),
            temp_token_expiry_minutes: 5,
            full_token_expiry_days: 7,
        });

        let token = service
            .issue(Uuid::new_v4(), "test@example.com", TokenKind::Full)
            .unwrap();

        assert!(matches!(
            other.verify(&token, TokenKind::Full),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            temp: false,
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            service.verify(&token, TokenKind::Full),
            Err(ServiceError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = test_service();
        assert!(matches!(
            service.verify("not-a-jwt", TokenKind::Full),
            Err(ServiceError::InvalidToken)
        ));
    }
}
