//! Session tokens
//!
//! Sessions are stateless JWTs. A token carries [`Claims`] about the authenticated user and is
//! signed either with a shared HS256 secret or with an RS256 private key. Nothing is stored
//! server side, so a valid, unexpired token is always accepted and logging out is left to
//! the client discarding its token.
//!
//! | Claim      | Description                                    |
//! | ---------- | ---------------------------------------------- |
//! | `sub`      | The user id.                                   |
//! | `email`    | The user's email at the time of issue.         |
//! | `username` | The user's display handle at the time of issue.|
//! | `iat`      | Issued at, seconds since the UNIX epoch.       |
//! | `exp`      | Expiry, always `iat` plus the configured lifetime. |
//! | `iss`      | Issuer, when configured.                       |

use std::path::Path;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::{CryptoError, SessionError},
    user::{User, UserId},
};

/// JWT claims for session tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: String,
    pub email: String,
    pub username: String,
    /// Issued at in seconds (as UTC timestamp)
    pub iat: i64,
    /// Expiration time in seconds (as UTC timestamp)
    pub exp: i64,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Claims for a user. Timing is filled in by [`TokenFactory::new_token`].
    pub fn new(user_id: &UserId, email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            username: username.into(),
            iat: 0,
            exp: 0,
            iss: None,
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(&self.sub)
    }
}

impl From<&User> for Claims {
    fn from(user: &User) -> Self {
        Claims::new(&user.id, user.email.clone(), user.username.clone())
    }
}

/// JWT algorithm type
#[derive(Clone)]
pub enum JwtAlgorithm {
    /// RS256 - RSA with SHA-256
    RS256 {
        /// Private key for signing JWTs (PEM format)
        private_key: Vec<u8>,
        /// Public key for verifying JWTs (PEM format)
        public_key: Vec<u8>,
    },
    /// HS256 - HMAC with SHA-256
    HS256 {
        /// Secret key for both signing and verifying
        secret_key: Vec<u8>,
    },
}

impl std::fmt::Debug for JwtAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtAlgorithm::RS256 { .. } => f.write_str("RS256"),
            JwtAlgorithm::HS256 { .. } => f.write_str("HS256"),
        }
    }
}

/// Configuration for JWT sessions
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Algorithm and keys for JWT
    pub algorithm: JwtAlgorithm,
    /// Issuer claim
    pub issuer: Option<String>,
    /// How long an issued token stays valid
    pub lifetime: Duration,
}

impl JwtConfig {
    /// Default token lifetime
    pub const DEFAULT_LIFETIME: Duration = Duration::hours(1);

    /// Longest lifetime a [`TokenFactory`] accepts
    pub const MAX_LIFETIME: Duration = Duration::days(365);

    /// Create a new JWT configuration with RS256 algorithm
    pub fn new_rs256(private_key: Vec<u8>, public_key: Vec<u8>) -> Self {
        Self {
            algorithm: JwtAlgorithm::RS256 {
                private_key,
                public_key,
            },
            issuer: None,
            lifetime: Self::DEFAULT_LIFETIME,
        }
    }

    /// Create a new JWT configuration with HS256 algorithm
    pub fn new_hs256(secret_key: Vec<u8>) -> Self {
        Self {
            algorithm: JwtAlgorithm::HS256 { secret_key },
            issuer: None,
            lifetime: Self::DEFAULT_LIFETIME,
        }
    }

    /// Create a new JWT configuration from RSA key files (PEM format)
    pub fn from_rs256_pem_files(
        private_key_path: impl AsRef<Path>,
        public_key_path: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        use std::fs::read;

        let private_key = read(private_key_path).map_err(|e| {
            CryptoError::JwtSigning(format!("Failed to read private key file: {e}"))
        })?;

        let public_key = read(public_key_path).map_err(|e| {
            CryptoError::JwtSigning(format!("Failed to read public key file: {e}"))
        })?;

        Ok(Self::new_rs256(private_key, public_key))
    }

    /// Set the issuer claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the token lifetime
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Get the algorithm to use with jsonwebtoken
    pub fn jwt_algorithm(&self) -> Algorithm {
        match &self.algorithm {
            JwtAlgorithm::RS256 { .. } => Algorithm::RS256,
            JwtAlgorithm::HS256 { .. } => Algorithm::HS256,
        }
    }
}

/// Issues and validates signed session tokens.
///
/// Keys are parsed once at construction, so a factory that exists can always sign.
pub struct TokenFactory {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
    lifetime: Duration,
}

impl TokenFactory {
    pub fn new(config: JwtConfig) -> Result<Self, Error> {
        if config.lifetime <= Duration::zero() {
            return Err(CryptoError::JwtSigning("Token lifetime must be positive".to_string()).into());
        }
        if config.lifetime > JwtConfig::MAX_LIFETIME {
            return Err(CryptoError::JwtSigning(format!(
                "Token lifetime must not exceed {} days",
                JwtConfig::MAX_LIFETIME.num_days()
            ))
            .into());
        }

        let (encoding_key, decoding_key) = match &config.algorithm {
            JwtAlgorithm::HS256 { secret_key } => {
                if secret_key.is_empty() {
                    return Err(
                        CryptoError::JwtSigning("Shared secret is not set".to_string()).into(),
                    );
                }
                (
                    EncodingKey::from_secret(secret_key),
                    DecodingKey::from_secret(secret_key),
                )
            }
            JwtAlgorithm::RS256 {
                private_key,
                public_key,
            } => {
                if private_key.is_empty() || public_key.is_empty() {
                    return Err(CryptoError::JwtSigning(
                        "RSA key pair is not set".to_string(),
                    )
                    .into());
                }
                let encoding_key = EncodingKey::from_rsa_pem(private_key).map_err(|e| {
                    CryptoError::JwtSigning(format!("Invalid RSA private key: {e}"))
                })?;
                let decoding_key = DecodingKey::from_rsa_pem(public_key).map_err(|e| {
                    CryptoError::JwtSigning(format!("Invalid RSA public key: {e}"))
                })?;
                (encoding_key, decoding_key)
            }
        };

        Ok(Self {
            algorithm: config.jwt_algorithm(),
            encoding_key,
            decoding_key,
            issuer: config.issuer,
            lifetime: config.lifetime,
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Sign `claims` with a fresh issue time and `exp = iat + lifetime`.
    ///
    /// Any timing or issuer already present on `claims` is replaced.
    pub fn new_token(&self, claims: &Claims) -> Result<String, Error> {
        let now = Utc::now();
        let exp = now.checked_add_signed(self.lifetime).ok_or_else(|| {
            CryptoError::JwtSigning("Token expiry is out of range".to_string())
        })?;
        let claims = Claims {
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
            ..claims.clone()
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, Error> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| CryptoError::JwtSigning(format!("Failed to encode JWT: {e}")).into())
    }

    /// Verify signature, algorithm, issuer and expiry, returning the embedded claims.
    pub fn parse(&self, token: &str) -> Result<Claims, Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::InvalidToken(format!("JWT validation failed: {e}")),
            })?;

        Ok(token_data.claims)
    }

    /// Re-issue a still valid token with a renewed expiry.
    ///
    /// Expired tokens are rejected with [`SessionError::Expired`], never re-signed.
    pub fn refresh(&self, token: &str) -> Result<String, Error> {
        let claims = self.parse(token)?;
        self.new_token(&claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

impl std::fmt::Debug for TokenFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenFactory")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
