//! Argon2id password hashing
//!
//! Hashing and verification are CPU-bound and run on the blocking pool.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use rand::rngs::OsRng;

#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Argon2id with 19 MiB memory, 2 iterations, 1 lane, 32-byte output
    pub fn new() -> Result<Self> {
        let params = Params::new(19456, 2, 1, Some(32))
            .map_err(|e| anyhow!("Failed to build Argon2 params: {}", e))?;
        Ok(Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let argon2 = self.argon2.clone();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow!("Failed to hash password: {}", e))
        })
        .await
        .context("Password hashing task panicked")?
    }

    /// `Ok(false)` on a wrong password, `Err` on a malformed hash
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        let argon2 = self.argon2.clone();

        tokio::task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|e| anyhow!("Failed to parse password hash: {}", e))?;
            match argon2.verify_password(password.as_bytes(), &parsed_hash) {
                Ok(_) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(anyhow!("Password verification error: {}", e)),
            }
        })
        .await
        .context("Password verification task panicked")?
    }
}
