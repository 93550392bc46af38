//! RFC 6238 time-based OTP engine.
//!
//! 30-second steps, HMAC-SHA1 dynamic truncation, 6 decimal digits. The
//! engine owns the window policy: `check` accepts the code for the current
//! step only, with no clock-skew allowance. Secrets are normalized once, at
//! import time; everything after that works on the canonical Base32 form.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::services::ServiceError;

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Clone, Copy)]
pub struct TotpEngine {
    period: u64,
    digits: u32,
}

impl Default for TotpEngine {
    fn default() -> Self {
        Self {
            period: 30,
            digits: 6,
        }
    }
}

impl TotpEngine {
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Canonicalize a user-supplied secret: strip all whitespace, uppercase,
    /// reject empty. Runs exactly once per secret, before first encryption,
    /// so stored ciphertext always decrypts to this form.
    pub fn normalize_secret(secret: &str) -> Result<String, ServiceError> {
        let normalized: String = secret
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        if normalized.is_empty() {
            return Err(ServiceError::InvalidSecret("secret is empty".to_string()));
        }

        Ok(normalized)
    }

    /// Current code for a canonical Base32 secret.
    pub fn generate(&self, secret: &str) -> Result<String, ServiceError> {
        self.generate_at(secret, unix_now())
    }

    /// Code for the window containing `unix_time`.
    pub fn generate_at(&self, secret: &str, unix_time: u64) -> Result<String, ServiceError> {
        let key = decode_secret(secret)?;
        let counter = unix_time / self.period;

        let mut mac = HmacSha1::new_from_slice(&key)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(&counter.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        // Dynamic truncation (RFC 4226 §5.3).
        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let binary = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);

        let code = binary % 10u32.pow(self.digits);
        Ok(format!("{:0width$}", code, width = self.digits as usize))
    }

    /// Strict single-window check: the code must match the current step.
    pub fn check(&self, code: &str, secret: &str) -> Result<bool, ServiceError> {
        self.check_at(code, secret, unix_now())
    }

    pub fn check_at(&self, code: &str, secret: &str, unix_time: u64) -> Result<bool, ServiceError> {
        let expected = self.generate_at(secret, unix_time)?;
        Ok(code.as_bytes().ct_eq(expected.as_bytes()).into())
    }

    /// Seconds until the next window boundary, in [1, period]. Display only;
    /// validation never consults it.
    pub fn time_remaining(&self) -> u64 {
        self.time_remaining_at(unix_now())
    }

    pub fn time_remaining_at(&self, unix_time: u64) -> u64 {
        self.period - (unix_time % self.period)
    }
}

fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

fn decode_secret(secret: &str) -> Result<Vec<u8>, ServiceError> {
    data_encoding::BASE32_NOPAD
        .decode(secret.trim_end_matches('=').as_bytes())
        .map_err(|e| ServiceError::InvalidSecret(format!("not valid Base32: {}", e)))
}
