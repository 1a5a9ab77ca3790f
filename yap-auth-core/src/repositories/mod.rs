//! Repository trait for the user store
//!
//! [`UserRepository`] is the single capability every storage backend provides. A backend is
//! chosen once at startup and shared as `Arc<dyn UserRepository>`.
//!
//! All backends share the same contract:
//!
//! - Inputs are validated with [`crate::validation`] before storage is touched, so every
//!   backend rejects the same requests with the same [`ValidationError`](crate::error::ValidationError).
//! - Email is the unique key. A second registration for the same email fails with
//!   [`AuthError::UserAlreadyExists`](crate::error::AuthError::UserAlreadyExists), even under
//!   concurrent requests.
//! - Credential digests never leave the backend. Every read returns a [`User`].
//! - A failed write leaves no partial state behind.

pub mod memory;

pub use memory::InMemoryUserRepository;

use async_trait::async_trait;

use crate::{
    Error,
    user::{NewUser, StoredUser, User, UserId, UserProfile},
};

/// Repository for user credentials and profiles
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Register a new user and return its freshly generated id.
    ///
    /// The password is hashed before it is stored.
    async fn new_user(&self, user: NewUser) -> Result<UserId, Error>;

    /// Check a login attempt.
    ///
    /// Returns `Ok(None)` when the email is unknown or the password does not match. The two
    /// cases are indistinguishable to the caller.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, Error>;

    /// Find a user by ID
    async fn get_user(&self, id: &UserId) -> Result<User, Error>;

    /// Replace the profile of an existing user wholesale.
    async fn update_profile(&self, id: &UserId, profile: UserProfile) -> Result<(), Error>;

    /// Bulk-load already hashed records, skipping emails that are already stored.
    ///
    /// Returns the number of records inserted.
    async fn import(&self, users: Vec<StoredUser>) -> Result<usize, Error>;

    /// Bring the schema up to date
    async fn migrate(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
