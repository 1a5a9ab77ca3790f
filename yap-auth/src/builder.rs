//! Repository factory
//!
//! [`build_repository`] turns a [`RepositoryConfig`] into a ready to use
//! `Arc<dyn UserRepository>`: it connects, applies migrations when asked to and imports the
//! seed dataset if one is configured.
//!
//! Relational backends are chosen by the connection string scheme:
//!
//! | Scheme                        | Backend    | Feature    |
//! | ----------------------------- | ---------- | ---------- |
//! | `postgres://`, `postgresql://`| PostgreSQL | `postgres` |
//! | `sqlite:`                     | SQLite     | `sqlite`   |
//!
//! # Example
//!
//! ```rust,no_run
//! use yap_auth::{RepositoryConfig, RepositoryType, build_repository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = build_repository(&RepositoryConfig {
//!     kind: RepositoryType::Relational,
//!     connection_string: Some("sqlite::memory:".to_string()),
//!     ..Default::default()
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```
use std::sync::Arc;

use yap_auth_core::{InMemoryUserRepository, UserRepository};

use crate::{
    config::{RepositoryConfig, RepositoryType},
    seed,
};

/// Errors that can occur while building a repository or a [`YapAuth`](crate::YapAuth).
#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Failed to load or import the seed dataset
    #[error("Seed dataset failed: {0}")]
    Seed(String),

    /// Failed to set up token signing
    #[error("Token configuration failed: {0}")]
    Token(String),
}

/// Relational drivers, keyed by connection string scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Driver {
    Postgres,
    Sqlite,
}

fn driver_for(connection_string: &str) -> Result<Driver, BuilderError> {
    if connection_string.starts_with("postgres://")
        || connection_string.starts_with("postgresql://")
    {
        Ok(Driver::Postgres)
    } else if connection_string.starts_with("sqlite:") {
        Ok(Driver::Sqlite)
    } else {
        Err(BuilderError::Configuration(
            "Unsupported connection string scheme".to_string(),
        ))
    }
}

/// Build the configured backend.
pub async fn build_repository(
    config: &RepositoryConfig,
) -> Result<Arc<dyn UserRepository>, BuilderError> {
    let repository: Arc<dyn UserRepository> = match config.kind {
        RepositoryType::InMemory => Arc::new(
            InMemoryUserRepository::new()
                .map_err(|e| BuilderError::Configuration(e.to_string()))?
                .with_required_profile(config.require_profile),
        ),
        RepositoryType::Relational => {
            let connection_string = config
                .connection_string
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    BuilderError::Configuration(
                        "A connection string is required for relational storage".to_string(),
                    )
                })?;

            let repository = connect(driver_for(connection_string)?, connection_string, config)
                .await?;

            if config.apply_migrations {
                repository
                    .migrate()
                    .await
                    .map_err(|e| BuilderError::Migration(e.to_string()))?;
            }

            repository
        }
    };

    if let Some(path) = &config.seed_dataset {
        let users = seed::load_seed(path)?;
        let total = users.len();
        let inserted = repository
            .import(users)
            .await
            .map_err(|e| BuilderError::Seed(e.to_string()))?;
        tracing::info!(inserted, skipped = total - inserted, "Imported seed dataset");
    }

    Ok(repository)
}

#[allow(unused_variables)]
async fn connect(
    driver: Driver,
    connection_string: &str,
    config: &RepositoryConfig,
) -> Result<Arc<dyn UserRepository>, BuilderError> {
    match driver {
        #[cfg(feature = "sqlite")]
        Driver::Sqlite => {
            let repository =
                yap_auth_storage_sqlite::SqliteUserRepository::connect(connection_string)
                    .await
                    .map_err(|e| BuilderError::StorageConnection(e.to_string()))?
                    .with_required_profile(config.require_profile);
            tracing::info!("Using SQLite user repository");
            Ok(Arc::new(repository))
        }
        #[cfg(feature = "postgres")]
        Driver::Postgres => {
            let repository =
                yap_auth_storage_postgres::PostgresUserRepository::connect(connection_string)
                    .await
                    .map_err(|e| BuilderError::StorageConnection(e.to_string()))?
                    .with_required_profile(config.require_profile);
            tracing::info!("Using PostgreSQL user repository");
            Ok(Arc::new(repository))
        }
        #[allow(unreachable_patterns)]
        driver => Err(BuilderError::Configuration(format!(
            "{driver:?} support is not enabled in this build"
        ))),
    }
}
