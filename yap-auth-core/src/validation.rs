//! Input validation shared by every repository backend
//!
//! Backends call these before touching storage so that each one rejects the same
//! inputs with the same [`ValidationError`].
use crate::{
    error::ValidationError,
    user::{NewUser, StoredUser, UserId, UserProfile},
};

/// Longest address permitted by RFC 5321.
const MAX_EMAIL_LENGTH: usize = 254;

/// Fail with `MissingField` when `value` is empty.
pub fn require_non_empty(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(format!("{field} is required")));
    }
    Ok(())
}

/// Validates an email address
///
/// Emails are compared case-sensitively and otherwise stored as given.
///
/// ```rust
/// use yap_auth_core::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    require_non_empty(email, "email")?;

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidField(
            "email is too long".to_string(),
        ));
    }

    Ok(())
}

/// Validates a login attempt before any lookup happens.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    require_non_empty(email, "email")?;
    require_non_empty(password, "password")
}

pub fn validate_user_id(user_id: &UserId) -> Result<(), ValidationError> {
    require_non_empty(user_id.as_str(), "id")
}

/// Validates a registration request.
///
/// A profile, when present, must be complete. With `require_profile` set, a missing
/// profile is rejected as well.
pub fn validate_new_user(user: &NewUser, require_profile: bool) -> Result<(), ValidationError> {
    validate_email(&user.email)?;
    require_non_empty(&user.username, "username")?;
    require_non_empty(&user.password, "password")?;

    match &user.profile {
        Some(profile) => profile.validate(),
        None if require_profile => Err(ValidationError::MissingField(
            "profile is required".to_string(),
        )),
        None => Ok(()),
    }
}

/// Validates a profile replacement.
pub fn validate_profile_update(
    user_id: &UserId,
    profile: &UserProfile,
) -> Result<(), ValidationError> {
    validate_user_id(user_id)?;
    profile.validate()
}

/// Validates a pre-hashed record before it is imported.
pub fn validate_stored_user(stored: &StoredUser) -> Result<(), ValidationError> {
    validate_user_id(&stored.user.id)?;
    validate_email(&stored.user.email)?;
    require_non_empty(&stored.user.username, "username")?;
    require_non_empty(&stored.salted_hash, "saltedHash")?;

    match &stored.user.profile {
        Some(profile) => profile.validate(),
        None => Ok(()),
    }
}
