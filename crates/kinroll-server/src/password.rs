//! argon2 password hashing.

use argon2::{
  Argon2,
  PasswordHash,
  PasswordHasher,
  PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::error::{Error, Result};

/// Hash `password` with a fresh random salt, returning a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Internal(format!("argon2 error: {e}")))
}

/// Constant-time check of `password` against a PHC string.
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}
