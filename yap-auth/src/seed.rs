//! Seed datasets
//!
//! A seed dataset is a JSON array of already hashed users, imported once when a repository
//! is built:
//!
//! ```json
//! [
//!   {
//!     "id": "usr_6Kz0M3vGqR1sYp8a",
//!     "email": "ada@example.com",
//!     "username": "ada",
//!     "saltedHash": "$argon2id$v=19$m=19456,t=2,p=1$...",
//!     "createdAt": "2024-01-01T00:00:00Z",
//!     "profile": { "gender": "female", "age": 36, "topics": ["math"] }
//!   }
//! ]
//! ```
//!
//! `id`, `createdAt`, `updatedAt` and `profile` are optional.
use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use yap_auth_core::{StoredUser, User, UserId, UserProfile};

use crate::BuilderError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedRecord {
    #[serde(default)]
    id: Option<UserId>,
    email: String,
    username: String,
    salted_hash: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    profile: Option<UserProfile>,
}

impl From<SeedRecord> for StoredUser {
    fn from(record: SeedRecord) -> Self {
        let now = Utc::now();
        let created_at = record.created_at.unwrap_or(now);

        StoredUser {
            user: User {
                id: record
                    .id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(UserId::new_random),
                email: record.email,
                username: record.username,
                profile: record.profile,
            },
            salted_hash: record.salted_hash,
            created_at,
            updated_at: record.updated_at.unwrap_or(created_at),
        }
    }
}

/// Parse a dataset document.
///
/// Records sharing an email collapse into the last one.
pub fn parse_seed(json: &str) -> Result<Vec<StoredUser>, BuilderError> {
    let records: Vec<SeedRecord> = serde_json::from_str(json)
        .map_err(|e| BuilderError::Seed(format!("Invalid seed dataset: {e}")))?;

    let mut position_by_email: HashMap<String, usize> = HashMap::new();
    let mut users: Vec<StoredUser> = Vec::with_capacity(records.len());

    for record in records {
        let stored = StoredUser::from(record);
        match position_by_email.get(stored.email()) {
            Some(&position) => {
                tracing::warn!(
                    email = %stored.email(),
                    "Duplicate email in seed dataset, keeping the last record"
                );
                users[position] = stored;
            }
            None => {
                position_by_email.insert(stored.email().to_string(), users.len());
                users.push(stored);
            }
        }
    }

    Ok(users)
}

/// Read and parse a dataset file.
pub fn load_seed(path: &Path) -> Result<Vec<StoredUser>, BuilderError> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        BuilderError::Seed(format!(
            "Failed to read seed dataset {}: {e}",
            path.display()
        ))
    })?;

    let users = parse_seed(&json)?;
    tracing::info!(path = %path.display(), count = users.len(), "Loaded seed dataset");
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yap_auth_core::Gender;

    #[test]
    fn test_parse_full_record() {
        let users = parse_seed(
            r#"[{
                "id": "usr_fixed",
                "email": "ada@example.com",
                "username": "ada",
                "saltedHash": "$argon2id$stub",
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-02-01T00:00:00Z",
                "profile": {"gender": "female", "age": 36, "topics": ["math"]}
            }]"#,
        )
        .unwrap();

        assert_eq!(users.len(), 1);
        let stored = &users[0];
        assert_eq!(stored.user.id, UserId::new("usr_fixed"));
        assert_eq!(stored.salted_hash, "$argon2id$stub");
        assert_eq!(stored.created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(stored.updated_at.to_rfc3339(), "2024-02-01T00:00:00+00:00");
        assert_eq!(
            stored.user.profile,
            Some(UserProfile::new(Gender::Female, 36, vec!["math".to_string()]))
        );
    }

    #[test]
    fn test_missing_optional_fields() {
        let users = parse_seed(
            r#"[{"email": "bob@example.com", "username": "bob", "saltedHash": "$argon2id$stub"}]"#,
        )
        .unwrap();

        let stored = &users[0];
        assert!(stored.user.id.as_str().starts_with("usr_"));
        assert!(stored.user.profile.is_none());
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[test]
    fn test_duplicate_emails_keep_last() {
        let users = parse_seed(
            r#"[
                {"email": "a@example.com", "username": "first", "saltedHash": "h1"},
                {"email": "b@example.com", "username": "other", "saltedHash": "h2"},
                {"email": "a@example.com", "username": "second", "saltedHash": "h3"}
            ]"#,
        )
        .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user.username, "second");
        assert_eq!(users[0].salted_hash, "h3");
        assert_eq!(users[1].user.username, "other");
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(parse_seed("{}"), Err(BuilderError::Seed(_))));
        assert!(matches!(
            parse_seed(r#"[{"email": "a@example.com"}]"#),
            Err(BuilderError::Seed(_))
        ));
        assert!(matches!(
            parse_seed(
                r#"[{"email": "a@example.com", "username": "a", "saltedHash": "h",
                     "profile": {"gender": "robot", "age": 3, "topics": ["x"]}}]"#
            ),
            Err(BuilderError::Seed(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_seed(Path::new("/nonexistent/seed.json")).unwrap_err();
        assert!(matches!(err, BuilderError::Seed(_)));
    }
}
