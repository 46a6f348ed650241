//! Password hashing with argon2id
//!
//! Verification and hashing are CPU-intensive on purpose; the async
//! wrappers move the work to the blocking thread pool so it never
//! stalls the runtime.

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub struct PasswordService;

impl PasswordService {
    /// Hash a password (blocking). Each call salts independently, so
    /// the same password never produces the same digest twice.
    pub fn hash(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
        Ok(hash.to_string())
    }

    /// Hash on the blocking thread pool.
    pub async fn hash_async(password: String) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("task join error: {e}"))?
    }

    /// Verify a password against a stored digest (blocking).
    pub fn verify(password: &str, hash: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("invalid hash format: {e}"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Verify on the blocking thread pool.
    pub async fn verify_async(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("task join error: {e}"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash("correct horse battery").unwrap();
        assert!(PasswordService::verify("correct horse battery", &hash).unwrap());
        assert!(!PasswordService::verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_salting_produces_distinct_hashes() {
        let h1 = PasswordService::hash("same-password").unwrap();
        let h2 = PasswordService::hash("same-password").unwrap();
        assert_ne!(h1, h2);
        assert!(PasswordService::verify("same-password", &h1).unwrap());
        assert!(PasswordService::verify("same-password", &h2).unwrap());
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let hash = PasswordService::hash_async("pw".to_string()).await.unwrap();
        assert!(PasswordService::verify_async("pw".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!PasswordService::verify_async("nope".to_string(), hash)
            .await
            .unwrap());
    }
}
