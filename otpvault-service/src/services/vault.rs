//! At-rest protection for TOTP shared secrets.
//!
//! ChaCha20-Poly1305 with a single process-wide key; blobs are
//! `base64(nonce || ciphertext)` with a fresh random 12-byte nonce per
//! encryption. Key material never leaves this module, so a future key
//! rotation touches nothing else. Decrypt fails closed: a tampered or
//! malformed blob is an error, never plaintext passthrough.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::config::VaultConfig;
use crate::services::ServiceError;

const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct SecretVault {
    key: Key,
}

impl SecretVault {
    pub fn new(config: &VaultConfig) -> Result<Self, anyhow::Error> {
        let key_bytes = hex::decode(&config.encryption_key)
            .map_err(|e| anyhow::anyhow!("Failed to parse vault key: {}", e))?;
        if key_bytes.len() != 32 {
            return Err(anyhow::anyhow!(
                "Vault key must be 32 bytes, got {}",
                key_bytes.len()
            ));
        }

        Ok(Self {
            key: *Key::from_slice(&key_bytes),
        })
    }

    /// Encrypt a secret string into a storable blob.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, ServiceError> {
        let cipher = ChaCha20Poly1305::new(&self.key);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Encryption failed: {}", e)))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(blob))
    }

    /// Decrypt a blob produced by `encrypt`. Any tampering, truncation or
    /// encoding damage yields `ServiceError::Decryption`.
    pub fn decrypt(&self, blob: &str) -> Result<String, ServiceError> {
        let data = BASE64.decode(blob).map_err(|_| ServiceError::Decryption)?;
        if data.len() < NONCE_LEN {
            return Err(ServiceError::Decryption);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(&self.key);

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| ServiceError::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| ServiceError::Decryption)
    }
}
