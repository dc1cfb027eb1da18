//! Credential hashing.
//!
//! Argon2id in PHC string format. Verification failures and malformed
//! stored hashes are both treated as a mismatch — callers only ever learn
//! "valid" or "not valid".

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use gatherly_core::{DomainError, DomainResult};

/// Hashes a password with a fresh salt.
///
/// # Errors
///
/// Returns [`DomainError::Storage`] if hashing fails; the password itself
/// never appears in the error.
pub fn hash(password: &str) -> DomainResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hashed| hashed.to_string())
        .map_err(|_| DomainError::Storage("password hashing failed".into()))
}

/// Verifies a password against a stored PHC string.
#[must_use]
pub fn verify(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
