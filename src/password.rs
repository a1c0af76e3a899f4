//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, which embed the algorithm, parameters
//! and salt, so verification needs nothing but the stored string.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;

use crate::Error;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string.
///
/// An unparseable stored hash never matches.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Runs hashing work on the blocking pool so it never stalls the async
/// workers.
pub async fn offload<T, F>(work: F) -> Result<T, Error>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::PasswordHash(format!("hashing task failed: {e}")))
}

/// Spend the same work as a real verification and discard the result.
/// Used when there is no stored hash to compare against.
pub fn burn(password: &str) {
    let _ = hash_password(password);
}
