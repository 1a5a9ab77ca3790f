//! In-memory user repository
//!
//! Suitable for tests, demos and single-process deployments. Nothing survives a restart.
//!
//! State lives behind a single [`RwLock`]. Password hashing and verification always happen
//! outside the lock, and any check-then-insert sequence runs under one write guard.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Error,
    crypto::PasswordHasher,
    error::AuthError,
    repositories::UserRepository,
    user::{NewUser, StoredUser, User, UserId, UserProfile},
    validation::{
        validate_credentials, validate_new_user, validate_profile_update, validate_stored_user,
        validate_user_id,
    },
};

#[derive(Default)]
struct State {
    by_email: HashMap<String, StoredUser>,
    email_by_id: HashMap<UserId, String>,
}

impl State {
    fn insert(&mut self, stored: StoredUser) {
        self.email_by_id
            .insert(stored.user.id.clone(), stored.email().to_string());
        self.by_email.insert(stored.email().to_string(), stored);
    }

    fn get_by_id_mut(&mut self, id: &UserId) -> Option<&mut StoredUser> {
        let email = self.email_by_id.get(id)?;
        self.by_email.get_mut(email)
    }
}

pub struct InMemoryUserRepository {
    state: RwLock<State>,
    hasher: PasswordHasher,
    require_profile: bool,
}

impl InMemoryUserRepository {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            state: RwLock::new(State::default()),
            hasher: PasswordHasher::new()?,
            require_profile: false,
        })
    }

    /// Reject registrations that arrive without a profile.
    pub fn with_required_profile(mut self, require_profile: bool) -> Self {
        self.require_profile = require_profile;
        self
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.state.read().await.by_email.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn new_user(&self, user: NewUser) -> Result<UserId, Error> {
        validate_new_user(&user, self.require_profile)?;

        // Cheap early rejection. The authoritative check happens under the write guard below.
        if self.state.read().await.by_email.contains_key(&user.email) {
            tracing::debug!(email = %user.email, "Email already registered");
            return Err(AuthError::UserAlreadyExists.into());
        }

        let salted_hash = self.hasher.hash(&user.password)?;
        let stored = StoredUser::new(
            User {
                id: UserId::new_random(),
                email: user.email,
                username: user.username,
                profile: user.profile,
            },
            salted_hash,
        );
        let id = stored.user.id.clone();

        let mut state = self.state.write().await;
        if state.by_email.contains_key(stored.email()) {
            tracing::debug!(email = %stored.email(), "Email already registered");
            return Err(AuthError::UserAlreadyExists.into());
        }
        state.insert(stored);

        tracing::debug!(user_id = %id, "Created user");
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, Error> {
        validate_credentials(email, password)?;

        let Some(stored) = self.state.read().await.by_email.get(email).cloned() else {
            tracing::debug!(email = %email, "Login for unknown email");
            self.hasher.verify_absent(password);
            return Ok(None);
        };

        if !self.hasher.verify(&stored.salted_hash, password) {
            tracing::debug!(user_id = %stored.user.id, "Password mismatch");
            return Ok(None);
        }

        Ok(Some(stored.to_user()))
    }

    async fn get_user(&self, id: &UserId) -> Result<User, Error> {
        validate_user_id(id)?;

        let state = self.state.read().await;
        state
            .email_by_id
            .get(id)
            .and_then(|email| state.by_email.get(email))
            .map(StoredUser::to_user)
            .ok_or_else(|| AuthError::UserNotFound.into())
    }

    async fn update_profile(&self, id: &UserId, profile: UserProfile) -> Result<(), Error> {
        validate_profile_update(id, &profile)?;

        let mut state = self.state.write().await;
        let stored = state.get_by_id_mut(id).ok_or(AuthError::UserNotFound)?;
        stored.user.profile = Some(profile);
        stored.updated_at = Utc::now();

        Ok(())
    }

    async fn import(&self, users: Vec<StoredUser>) -> Result<usize, Error> {
        for stored in &users {
            validate_stored_user(stored)?;
        }

        let mut state = self.state.write().await;
        let mut inserted = 0;

        for stored in users {
            if state.by_email.contains_key(stored.email())
                || state.email_by_id.contains_key(&stored.user.id)
            {
                tracing::debug!(user_id = %stored.user.id, "Skipping existing user");
                continue;
            }
            state.insert(stored);
            inserted += 1;
        }

        Ok(inserted)
    }
}

impl std::fmt::Debug for InMemoryUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserRepository")
            .field("require_profile", &self.require_profile)
            .finish_non_exhaustive()
    }
}
