//! # yap-auth
//!
//! Authentication and credential storage for the yapyapyap chat service.
//!
//! yap-auth registers users, checks passwords and issues signed session tokens. Users are kept in
//! a pluggable [`UserRepository`]:
//! - in memory, for tests and single-process deployments
//! - SQLite (feature `sqlite`, enabled by default)
//! - PostgreSQL (feature `postgres`)
//!
//! Sessions are stateless JWTs signed with a shared secret (HS256) or an RSA key pair (RS256).
//!
//! ## Example
//!
//! ```rust,no_run
//! use yap_auth::{NewUser, YapAuth, YapAuthConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = YapAuthConfig::load()?;
//!     let auth = YapAuth::from_config(&config).await?;
//!
//!     let registration = auth
//!         .register(
//!             NewUser::builder()
//!                 .email("ada@example.com")
//!                 .username("ada")
//!                 .password("correct horse battery staple")
//!                 .build()?,
//!         )
//!         .await?;
//!
//!     let claims = auth.validate_token(&registration.token)?;
//!     assert_eq!(claims.user_id(), registration.user_id);
//!     Ok(())
//! }
//! ```
pub mod builder;
pub mod config;
pub mod seed;

use std::sync::Arc;

use yap_auth_core::error::AuthError;

pub use builder::{BuilderError, build_repository};
pub use config::{RepositoryConfig, RepositoryType, SigningConfig, TokenConfig, YapAuthConfig};

/// Re-export core types from yap_auth_core
pub use yap_auth_core::{
    Claims, Error, Gender, InMemoryUserRepository, JwtAlgorithm, JwtConfig, NewUser,
    PasswordHasher, StoredUser, TokenFactory, User, UserId, UserProfile, UserRepository,
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature is enabled.
#[cfg(feature = "sqlite")]
pub use yap_auth_storage_sqlite::SqliteUserRepository;

#[cfg(feature = "postgres")]
pub use yap_auth_storage_postgres::PostgresUserRepository;

/// The result of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user_id: UserId,
    /// A session token for the new user, so registration doubles as the first login
    pub token: String,
}

/// Entry point for registration, login and session handling.
///
/// Cloning is cheap. Both collaborators are shared.
#[derive(Clone)]
pub struct YapAuth {
    repository: Arc<dyn UserRepository>,
    tokens: Arc<TokenFactory>,
}

impl YapAuth {
    pub fn new(repository: Arc<dyn UserRepository>, tokens: Arc<TokenFactory>) -> Self {
        Self { repository, tokens }
    }

    /// Build the repository and token factory described by `config`.
    pub async fn from_config(config: &YapAuthConfig) -> Result<Self, BuilderError> {
        let tokens = config
            .token
            .to_jwt_config()
            .and_then(TokenFactory::new)
            .map_err(|e| BuilderError::Token(e.to_string()))?;

        let repository = build_repository(&config.repository).await?;

        Ok(Self::new(repository, Arc::new(tokens)))
    }

    pub fn repository(&self) -> &Arc<dyn UserRepository> {
        &self.repository
    }

    pub fn tokens(&self) -> &Arc<TokenFactory> {
        &self.tokens
    }

    /// Create a user and issue its first session token.
    pub async fn register(&self, user: NewUser) -> Result<Registration, Error> {
        let (email, username) = (user.email.clone(), user.username.clone());

        let user_id = self.repository.new_user(user).await?;
        let token = self
            .tokens
            .new_token(&Claims::new(&user_id, email, username))?;

        tracing::info!(user_id = %user_id, "Registered user");
        Ok(Registration { user_id, token })
    }

    /// Check credentials and issue a session token.
    ///
    /// An unknown email and a wrong password both fail with
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> Result<String, Error> {
        let user = self
            .repository
            .authenticate(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.tokens.new_token(&Claims::from(&user))
    }

    pub async fn get_user(&self, id: &UserId) -> Result<User, Error> {
        self.repository.get_user(id).await
    }

    pub async fn update_profile(&self, id: &UserId, profile: UserProfile) -> Result<(), Error> {
        self.repository.update_profile(id, profile).await
    }

    /// Verify a token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, Error> {
        self.tokens.parse(token)
    }

    /// Issue a fresh token for claims that were already validated.
    pub fn refresh_session(&self, claims: &Claims) -> Result<String, Error> {
        self.tokens.new_token(claims)
    }

    /// Exchange a still valid token for one with a renewed expiry.
    pub fn refresh_token(&self, token: &str) -> Result<String, Error> {
        self.tokens.refresh(token)
    }
}

impl std::fmt::Debug for YapAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YapAuth")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}
