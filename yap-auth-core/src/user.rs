//! Users and profiles
//!
//! This module contains the core user struct and related functionality.
//!
//! | Field      | Type                  | Description                                            |
//! | ---------- | --------------------- | ------------------------------------------------------ |
//! | `id`       | `UserId`              | Opaque identifier, assigned at creation and immutable. |
//! | `email`    | `String`              | Natural key, unique and case-sensitive.                |
//! | `username` | `String`              | Display handle, not guaranteed to be unique.           |
//! | `profile`  | `Option<UserProfile>` | Gender, age and topics, present as a whole or absent.  |
//!
//! Credentials live only in [`StoredUser`], which repositories accept for seeding
//! but never hand back to callers.
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::{ValidationError, utilities::RequiredFieldExt},
    id::generate_prefixed_id,
};

/// A unique, stable identifier for a specific user
/// This value should be treated as opaque, and should not be used as a UUID even if it may look like one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Self-reported gender. Unknown values are rejected rather than defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non-binary",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "non-binary" => Ok(Gender::NonBinary),
            "other" => Ok(Gender::Other),
            "" => Err(ValidationError::MissingField("gender is required".to_string())),
            other => Err(ValidationError::InvalidField(format!(
                "unknown gender: {other}"
            ))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional profile data attached to a user.
///
/// A zero `age` or an empty `topics` list counts as unset. Profiles are only ever
/// stored whole, see [`UserProfile::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub gender: Gender,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl UserProfile {
    /// Largest age every backend can store. PostgreSQL keeps `age` in a signed 32-bit column.
    pub const MAX_AGE: u32 = i32::MAX as u32;

    pub fn new(gender: Gender, age: u32, topics: Vec<String>) -> Self {
        Self {
            gender,
            age,
            topics,
        }
    }

    /// Reject partially filled profiles.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.age == 0 {
            return Err(ValidationError::MissingField("age is required".to_string()));
        }

        if self.age > Self::MAX_AGE {
            return Err(ValidationError::InvalidField(format!(
                "age must not exceed {}",
                Self::MAX_AGE
            )));
        }

        if self.topics.is_empty() {
            return Err(ValidationError::MissingField(
                "topics is required".to_string(),
            ));
        }

        Ok(())
    }
}

/// Representation of a user as returned by every repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

/// A registration request.
///
/// The password is only held long enough to be hashed and is redacted from `Debug` output.
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub profile: Option<UserProfile>,
}

impl NewUser {
    pub fn builder() -> NewUserBuilder {
        NewUserBuilder::default()
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

#[derive(Default)]
pub struct NewUserBuilder {
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    profile: Option<UserProfile>,
}

impl NewUserBuilder {
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn profile(mut self, profile: Option<UserProfile>) -> Self {
        self.profile = profile;
        self
    }

    pub fn build(self) -> Result<NewUser, Error> {
        Ok(NewUser {
            email: self.email.require_field("email")?,
            username: self.username.require_field("username")?,
            password: self.password.require_field("password")?,
            profile: self.profile,
        })
    }
}

/// A user together with its credential digest, as held inside a repository.
#[derive(Clone)]
pub struct StoredUser {
    pub user: User,
    pub salted_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    pub fn new(user: User, salted_hash: String) -> Self {
        let now = Utc::now();
        Self {
            user,
            salted_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    /// Strip the credential digest.
    pub fn to_user(&self) -> User {
        self.user.clone()
    }
}

impl fmt::Debug for StoredUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredUser")
            .field("user", &self.user)
            .field("salted_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
