//! Configuration
//!
//! Settings are layered with the `config` crate, lowest precedence first:
//!
//! 1. `config/yap-auth.{toml,yaml,json}` (optional)
//! 2. `config/local.{toml,yaml,json}` (optional)
//! 3. environment variables prefixed with `YAP_AUTH`, using `__` as separator,
//!    e.g. `YAP_AUTH__TOKEN__SIGNING__SECRET`
//!
//! ```toml
//! [repository]
//! kind = "relational"
//! connection_string = "sqlite://yap.db"
//! seed_dataset = "data/users.json"
//!
//! [token]
//! lifetime_seconds = 900
//! issuer = "yapyapyap"
//!
//! [token.signing]
//! strategy = "key-pair"
//! private_key_path = "keys/app.key"
//! public_key_path = "keys/app.pub"
//! ```
use std::path::PathBuf;

use chrono::Duration;
use serde::Deserialize;
use yap_auth_core::{Error, JwtConfig, error::CryptoError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YapAuthConfig {
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub token: TokenConfig,
}

/// Which storage backend holds user records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepositoryType {
    #[default]
    InMemory,
    Relational,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub kind: RepositoryType,
    /// Required for relational backends. The scheme picks the driver.
    #[serde(default)]
    pub connection_string: Option<String>,
    /// JSON file of pre-hashed users to import at startup
    #[serde(default)]
    pub seed_dataset: Option<PathBuf>,
    #[serde(default)]
    pub require_profile: bool,
    #[serde(default = "default_apply_migrations")]
    pub apply_migrations: bool,
}

fn default_apply_migrations() -> bool {
    true
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            kind: RepositoryType::default(),
            connection_string: None,
            seed_dataset: None,
            require_profile: false,
            apply_migrations: default_apply_migrations(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_lifetime_seconds")]
    pub lifetime_seconds: i64,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub signing: SigningConfig,
}

fn default_lifetime_seconds() -> i64 {
    JwtConfig::DEFAULT_LIFETIME.num_seconds()
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            lifetime_seconds: default_lifetime_seconds(),
            issuer: None,
            signing: SigningConfig::default(),
        }
    }
}

/// How session tokens are signed.
#[derive(Clone, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum SigningConfig {
    /// HS256 with a secret shared by every verifier
    SharedSecret { secret: String },
    /// RS256 with a PEM key pair read from disk
    KeyPair {
        private_key_path: PathBuf,
        public_key_path: PathBuf,
    },
}

impl Default for SigningConfig {
    fn default() -> Self {
        SigningConfig::SharedSecret {
            secret: String::new(),
        }
    }
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningConfig::SharedSecret { .. } => f
                .debug_struct("SharedSecret")
                .field("secret", &"<redacted>")
                .finish(),
            SigningConfig::KeyPair {
                private_key_path,
                public_key_path,
            } => f
                .debug_struct("KeyPair")
                .field("private_key_path", private_key_path)
                .field("public_key_path", public_key_path)
                .finish(),
        }
    }
}

impl TokenConfig {
    /// Resolve into a [`JwtConfig`], reading key files if needed.
    pub fn to_jwt_config(&self) -> Result<JwtConfig, Error> {
        let jwt = match &self.signing {
            SigningConfig::SharedSecret { secret } => {
                JwtConfig::new_hs256(secret.as_bytes().to_vec())
            }
            SigningConfig::KeyPair {
                private_key_path,
                public_key_path,
            } => JwtConfig::from_rs256_pem_files(private_key_path, public_key_path)?,
        };

        let lifetime = Duration::try_seconds(self.lifetime_seconds).ok_or_else(|| {
            CryptoError::JwtSigning("Token lifetime is out of range".to_string())
        })?;
        let jwt = jwt.with_lifetime(lifetime);

        Ok(match &self.issuer {
            Some(issuer) => jwt.with_issuer(issuer),
            None => jwt,
        })
    }
}

impl YapAuthConfig {
    /// Load from the default file locations and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/yap-auth").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("YAP_AUTH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Parse a TOML document, without consulting files or the environment.
    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
