//! Password hashing
//!
//! One-way Argon2id hashes in PHC string format. The salt is generated
//! per hash, so the stored value carries everything verification needs.

use crate::error::{AppError, Result};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Hash a plaintext password into a PHC string
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AppError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Check a candidate plaintext against a stored PHC string
pub fn verify_password(stored: &str, candidate: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| AppError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok())
}
