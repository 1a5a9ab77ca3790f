//! Schema migrations for the relational backends
//!
//! Each backend defines its migrations as [`Migration`] implementations and applies them
//! through its own [`MigrationManager`]. Applied versions are tracked in the
//! `_yap_auth_migrations` table, so running the same set twice is a no-op.
use async_trait::async_trait;
use sqlx::Database;
use thiserror::Error;
use yap_auth_core::error::StorageError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;

impl From<MigrationError> for yap_auth_core::Error {
    fn from(error: MigrationError) -> Self {
        tracing::error!(error = %error, "Migration failed");
        StorageError::Migration(error.to_string()).into()
    }
}

#[async_trait]
pub trait Migration<DB: Database>: Send + Sync {
    /// Execute the migration
    async fn up<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Rollback the migration
    async fn down<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: i64, // unix timestamp since no database can agree on a datetime type
}

#[async_trait]
pub trait MigrationManager<DB: Database>: Send + Sync {
    fn get_migration_table_name(&self) -> &str {
        "_yap_auth_migrations"
    }

    /// Initialize migration tracking table
    async fn initialize(&self) -> Result<()>;

    /// Apply pending migrations in version order, each in its own transaction
    async fn up(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Roll back applied migrations in reverse version order
    async fn down(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Get list of applied migrations
    async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>>;

    /// Check if specific migration was applied
    async fn is_applied(&self, version: i64) -> Result<bool>;
}

/// Reject a migration set whose versions are not strictly increasing.
///
/// Managers call this before touching the database so that a misordered or duplicated
/// version fails loudly instead of being silently skipped.
pub fn check_versions<DB: Database>(migrations: &[Box<dyn Migration<DB>>]) -> Result<()> {
    for pair in migrations.windows(2) {
        if pair[1].version() <= pair[0].version() {
            return Err(MigrationError::Migration(format!(
                "migration {} (version {}) must come after {} (version {})",
                pair[1].name(),
                pair[1].version(),
                pair[0].name(),
                pair[0].version()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Sqlite;

    struct Noop(i64, &'static str);

    #[async_trait]
    impl Migration<Sqlite> for Noop {
        async fn up<'a>(&'a self, _conn: &'a mut sqlx::SqliteConnection) -> Result<()> {
            Ok(())
        }

        async fn down<'a>(&'a self, _conn: &'a mut sqlx::SqliteConnection) -> Result<()> {
            Ok(())
        }

        fn version(&self) -> i64 {
            self.0
        }

        fn name(&self) -> &str {
            self.1
        }
    }

    #[test]
    fn test_check_versions() {
        let ordered: Vec<Box<dyn Migration<Sqlite>>> =
            vec![Box::new(Noop(1, "first")), Box::new(Noop(2, "second"))];
        assert!(check_versions(&ordered).is_ok());

        let duplicated: Vec<Box<dyn Migration<Sqlite>>> =
            vec![Box::new(Noop(1, "first")), Box::new(Noop(1, "again"))];
        assert!(check_versions(&duplicated).is_err());

        let reversed: Vec<Box<dyn Migration<Sqlite>>> =
            vec![Box::new(Noop(2, "second")), Box::new(Noop(1, "first"))];
        assert!(check_versions(&reversed).is_err());
    }

    #[test]
    fn test_migration_error_maps_to_storage_error() {
        let error: yap_auth_core::Error = MigrationError::Migration("boom".to_string()).into();
        assert!(error.is_storage_error());
    }
}
