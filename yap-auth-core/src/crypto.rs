//! Password hashing
//!
//! Passwords are hashed with Argon2id into self-describing PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`). Verification reads the algorithm and
//! cost parameters back out of the digest, so digests produced under an older cost
//! setting, or by any other PHC algorithm `password-auth` understands, keep verifying
//! after the constants below are raised.
//!
//! The cost is fixed at build time and is never chosen per call.
//!
//! See: <https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html#argon2id>

use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, Version, password_hash::SaltString};

use crate::{
    Error,
    error::CryptoError,
    id::{generate_prefixed_id, random_bytes},
};

/// Memory cost in KiB.
pub const ARGON2_MEMORY_KIB: u32 = 19_456;
/// Number of passes over memory.
pub const ARGON2_ITERATIONS: u32 = 2;
/// Degree of parallelism.
pub const ARGON2_PARALLELISM: u32 = 1;

const SALT_LENGTH: usize = 16;

/// One-way, salted, adaptive hashing of credentials.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Digest of a random password nobody knows, verified against when there is no account.
    decoy: Arc<str>,
}

impl PasswordHasher {
    pub fn new() -> Result<Self, Error> {
        let params = Params::new(
            ARGON2_MEMORY_KIB,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            None,
        )
        .map_err(|e| CryptoError::PasswordHash(format!("Invalid Argon2 parameters: {e}")))?;

        let mut hasher = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy: Arc::from(""),
        };
        hasher.decoy = Arc::from(hasher.hash(&generate_prefixed_id("decoy"))?);

        Ok(hasher)
    }

    /// Hash a password into a PHC string with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        let salt = SaltString::encode_b64(&random_bytes::<SALT_LENGTH>())
            .map_err(|e| CryptoError::PasswordHash(format!("Failed to encode salt: {e}")))?;

        let digest = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CryptoError::PasswordHash(e.to_string()))?;

        Ok(digest.to_string())
    }

    /// Check a password against a stored digest.
    ///
    /// Malformed digests never match. The final comparison is constant-time.
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        password_auth::verify_password(password, digest).is_ok()
    }

    /// Spend the same work as [`PasswordHasher::verify`] when no digest exists for a login.
    ///
    /// Always returns `false`. Callers use it on the unknown-account path so the response
    /// time does not reveal whether the email or the password was wrong.
    pub fn verify_absent(&self, password: &str) -> bool {
        let _ = self.verify(&self.decoy, password);
        false
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("memory_kib", &ARGON2_MEMORY_KIB)
            .field("iterations", &ARGON2_ITERATIONS)
            .field("parallelism", &ARGON2_PARALLELISM)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new().unwrap();
        let digest = hasher.hash("correct horse battery staple").unwrap();

        assert!(hasher.verify(&digest, "correct horse battery staple"));
        assert!(!hasher.verify(&digest, "correct horse battery stapler"));
        assert!(!hasher.verify(&digest, ""));
    }

    #[test]
    fn test_distinct_passwords_never_cross_verify() {
        let hasher = PasswordHasher::new().unwrap();
        let passwords = ["alpha", "bravo", "Alpha", "alpha "];
        let digests: Vec<_> = passwords.iter().map(|p| hasher.hash(p).unwrap()).collect();

        for (i, digest) in digests.iter().enumerate() {
            for (j, password) in passwords.iter().enumerate() {
                assert_eq!(hasher.verify(digest, password), i == j);
            }
        }
    }

    #[test]
    fn test_digest_is_salted_and_self_describing() {
        let hasher = PasswordHasher::new().unwrap();
        let first = hasher.hash("password").unwrap();
        let second = hasher.hash("password").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$v=19$"));
        assert!(first.contains(&format!(
            "m={ARGON2_MEMORY_KIB},t={ARGON2_ITERATIONS},p={ARGON2_PARALLELISM}"
        )));
    }

    #[test]
    fn test_verify_accepts_digest_with_other_cost() {
        let weaker = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(8 * 1024, 1, 1, None).unwrap(),
        );
        let salt = SaltString::encode_b64(&[7u8; SALT_LENGTH]).unwrap();
        let digest = weaker
            .hash_password(b"legacy", &salt)
            .unwrap()
            .to_string();

        let hasher = PasswordHasher::new().unwrap();
        assert!(hasher.verify(&digest, "legacy"));
    }

    #[test]
    fn test_verify_absent_runs_a_full_verification() {
        let hasher = PasswordHasher::new().unwrap();

        assert!(hasher.decoy.starts_with("$argon2id$v=19$"));
        assert!(hasher.decoy.contains(&format!(
            "m={ARGON2_MEMORY_KIB},t={ARGON2_ITERATIONS},p={ARGON2_PARALLELISM}"
        )));
        assert!(!hasher.verify_absent("password"));
        assert!(!hasher.verify_absent(""));

        // Clones share the decoy
        assert_eq!(hasher.clone().decoy, hasher.decoy);
    }

    #[test]
    fn test_malformed_digest_does_not_verify() {
        let hasher = PasswordHasher::new().unwrap();
        assert!(!hasher.verify("not-a-phc-string", "password"));
        assert!(!hasher.verify("", "password"));
    }
}
