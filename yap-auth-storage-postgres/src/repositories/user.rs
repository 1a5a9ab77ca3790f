use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool, postgres::PgPoolOptions};
use yap_auth_core::{
    Error, NewUser, PasswordHasher, StoredUser, User, UserId, UserProfile,
    error::{AuthError, StorageError, ValidationError, utilities::DatabaseResultExt},
    repositories::UserRepository,
    validation::{
        validate_credentials, validate_new_user, validate_profile_update, validate_stored_user,
        validate_user_id,
    },
};
use yap_auth_migration::MigrationManager;

use crate::{
    PostgresUser,
    migrations::{self, PostgresMigrationManager},
};

pub struct PostgresUserRepository {
    pool: PgPool,
    hasher: PasswordHasher,
    require_profile: bool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Result<Self, Error> {
        Ok(Self {
            pool,
            hasher: PasswordHasher::new()?,
            require_profile: false,
        })
    }

    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = PgPoolOptions::new().connect(url).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            StorageError::Connection("Failed to connect to PostgreSQL".to_string())
        })?;

        Self::new(pool)
    }

    /// Reject registrations that arrive without a profile.
    pub fn with_required_profile(mut self, require_profile: bool) -> Self {
        self.require_profile = require_profile;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn upsert_profile(
    conn: &mut PgConnection,
    user_id: &UserId,
    profile: &UserProfile,
) -> Result<(), Error> {
    let age = i32::try_from(profile.age)
        .map_err(|_| ValidationError::InvalidField("age is out of range".to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO profile (user_id, gender, age, topics)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id) DO UPDATE
        SET gender = EXCLUDED.gender, age = EXCLUDED.age, topics = EXCLUDED.topics
        "#,
    )
    .bind(user_id.as_str())
    .bind(profile.gender.as_str())
    .bind(age)
    .bind(&profile.topics)
    .execute(conn)
    .await
    .map_db_err("Failed to save profile")?;

    Ok(())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn new_user(&self, user: NewUser) -> Result<UserId, Error> {
        validate_new_user(&user, self.require_profile)?;

        let salted_hash = self.hasher.hash(&user.password)?;
        let id = UserId::new_random();
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_db_err("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO login (id, email, username, salted_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id.as_str())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&salted_hash)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tracing::debug!(email = %user.email, "Email already registered");
                return Err(AuthError::UserAlreadyExists.into());
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create user");
                return Err(StorageError::Database("Failed to create user".to_string()).into());
            }
        }

        if let Some(profile) = &user.profile {
            upsert_profile(&mut *tx, &id, profile).await?;
        }

        tx.commit().await.map_db_err("Failed to commit user")?;

        tracing::debug!(user_id = %id, "Created user");
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, Error> {
        validate_credentials(email, password)?;

        let row = sqlx::query_as::<_, PostgresUser>(
            r#"
            SELECT l.id, l.email, l.username, l.salted_hash, p.gender, p.age, p.topics
            FROM login l
            LEFT JOIN profile p ON p.user_id = l.id
            WHERE l.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_db_err("Failed to look up user")?;

        let Some(row) = row else {
            tracing::debug!(email = %email, "Login for unknown email");
            self.hasher.verify_absent(password);
            return Ok(None);
        };

        let (user, salted_hash) = row.into_parts()?;
        if !self.hasher.verify(&salted_hash, password) {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Ok(None);
        }

        Ok(Some(user))
    }

    async fn get_user(&self, id: &UserId) -> Result<User, Error> {
        validate_user_id(id)?;

        let row = sqlx::query_as::<_, PostgresUser>(
            r#"
            SELECT l.id, l.email, l.username, l.salted_hash, p.gender, p.age, p.topics
            FROM login l
            LEFT JOIN profile p ON p.user_id = l.id
            WHERE l.id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_db_err("Failed to get user")?
        .ok_or(AuthError::UserNotFound)?;

        Ok(row.into_parts()?.0)
    }

    async fn update_profile(&self, id: &UserId, profile: UserProfile) -> Result<(), Error> {
        validate_profile_update(id, &profile)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_db_err("Failed to begin transaction")?;

        // Row lock on the login keeps concurrent profile writes for the same user serialized
        let updated = sqlx::query("UPDATE login SET updated_at = $2 WHERE id = $1")
            .bind(id.as_str())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_db_err("Failed to update user")?;

        if updated.rows_affected() == 0 {
            return Err(AuthError::UserNotFound.into());
        }

        upsert_profile(&mut *tx, id, &profile).await?;

        tx.commit().await.map_db_err("Failed to commit profile")?;

        Ok(())
    }

    async fn import(&self, users: Vec<StoredUser>) -> Result<usize, Error> {
        for stored in &users {
            validate_stored_user(stored)?;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_db_err("Failed to begin transaction")?;
        let mut inserted = 0;

        for stored in &users {
            let result = sqlx::query(
                r#"
                INSERT INTO login (id, email, username, salted_hash, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(stored.user.id.as_str())
            .bind(&stored.user.email)
            .bind(&stored.user.username)
            .bind(&stored.salted_hash)
            .bind(stored.created_at)
            .bind(stored.updated_at)
            .execute(&mut *tx)
            .await
            .map_db_err("Failed to import user")?;

            if result.rows_affected() == 0 {
                tracing::debug!(user_id = %stored.user.id, "Skipping existing user");
                continue;
            }

            if let Some(profile) = &stored.user.profile {
                upsert_profile(&mut *tx, &stored.user.id, profile).await?;
            }
            inserted += 1;
        }

        tx.commit().await.map_db_err("Failed to commit import")?;

        Ok(inserted)
    }

    async fn migrate(&self) -> Result<(), Error> {
        let manager = PostgresMigrationManager::new(self.pool.clone());
        manager.initialize().await?;
        manager.up(&migrations::all()).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_db_err("Health check failed")?;
        Ok(())
    }
}
