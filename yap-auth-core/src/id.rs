//! Random identifier generation
//!
//! Identifiers are opaque, URL-safe strings of the form `{prefix}_{random}` carrying
//! at least 96 bits of entropy from the operating system RNG.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

/// Fill a fixed-size buffer from the OS RNG.
///
/// # Panics
///
/// Panics if the OS random number generator fails. This indicates a critical
/// system failure (e.g., /dev/urandom unavailable) from which recovery is not
/// possible for security-sensitive operations.
pub(crate) fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    bytes
}

/// Generate a prefixed ID with 96 bits of entropy
///
/// # Example
/// ```
/// use yap_auth_core::id::generate_prefixed_id;
///
/// let user_id = generate_prefixed_id("usr");
/// assert!(user_id.starts_with("usr_"));
/// ```
pub fn generate_prefixed_id(prefix: &str) -> String {
    let encoded = BASE64_URL_SAFE_NO_PAD.encode(random_bytes::<12>());
    format!("{prefix}_{encoded}")
}
