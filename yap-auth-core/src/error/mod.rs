pub mod utilities;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Seed dataset error: {0}")]
    Seed(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("JWT signing failed: {0}")]
    JwtSigning(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl Error {
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// The email is already registered.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Auth(AuthError::UserAlreadyExists))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Auth(AuthError::UserNotFound))
    }

    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Error::Auth(AuthError::InvalidCredentials))
    }

    pub fn is_token_expired(&self) -> bool {
        matches!(self, Error::Session(SessionError::Expired))
    }

    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Error::Session(SessionError::InvalidToken(_)))
    }

    pub fn is_signing_error(&self) -> bool {
        matches!(self, Error::Crypto(CryptoError::JwtSigning(_)))
    }

    /// Transport or storage failure. Safe for the caller to retry.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
