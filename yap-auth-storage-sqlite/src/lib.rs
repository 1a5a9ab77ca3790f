//! SQLite backend for yap-auth
//!
//! Credentials and profiles are kept in two tables:
//!
//! - `login`: id, email (unique), username, salted hash and unix timestamps
//! - `profile`: one optional row per login, with topics stored as a JSON array
//!
//! Every multi-statement write runs in a single transaction. Run
//! [`UserRepository::migrate`](yap_auth_core::UserRepository::migrate) once before use.
//!
//! ```rust,ignore
//! use yap_auth_core::UserRepository;
//! use yap_auth_storage_sqlite::SqliteUserRepository;
//!
//! let repo = SqliteUserRepository::connect("sqlite://yap.db").await?;
//! repo.migrate().await?;
//! ```
pub mod migrations;
pub mod repositories;

pub use repositories::SqliteUserRepository;

use yap_auth_core::{
    Error, Gender, User, UserId, UserProfile, error::utilities::DatabaseResultExt,
};

/// A `login` row joined with its optional `profile` row.
#[derive(sqlx::FromRow)]
pub(crate) struct SqliteUser {
    id: String,
    email: String,
    username: String,
    salted_hash: String,
    gender: Option<String>,
    age: Option<i64>,
    topics: Option<String>,
}

impl SqliteUser {
    /// Split the row into the public user and its credential digest.
    pub(crate) fn into_parts(self) -> Result<(User, String), Error> {
        let profile = match (self.gender, self.age, self.topics) {
            (Some(gender), Some(age), Some(topics)) => Some(UserProfile::new(
                gender
                    .parse::<Gender>()
                    .map_db_err("Stored profile has an invalid gender")?,
                u32::try_from(age).map_db_err("Stored profile has an invalid age")?,
                serde_json::from_str(&topics).map_db_err("Stored profile has invalid topics")?,
            )),
            _ => None,
        };

        let user = User {
            id: UserId::new(&self.id),
            email: self.email,
            username: self.username,
            profile,
        };

        Ok((user, self.salted_hash))
    }
}
