//! Argon2id password hashing. The PHC string returned by `hash_password`
//! embeds the salt and cost parameters, so `verify_password` needs no
//! out-of-band state.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string. The caller decides
/// what a mismatch means; this function only answers yes or no.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), anyhow::Error> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| anyhow::anyhow!("Password verification failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_phc_string() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_verify_accepts_matching_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_password_and_garbage_hash() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("incorrect horse", &hash).is_err());
        assert!(verify_password("correct horse battery", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_salt_is_fresh_per_hash() {
        let a = hash_password("correct horse battery").unwrap();
        let b = hash_password("correct horse battery").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("correct horse battery", &a).is_ok());
        assert!(verify_password("correct horse battery", &b).is_ok());
    }
}
