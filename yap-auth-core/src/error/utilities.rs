use crate::{
    Error,
    error::{StorageError, ValidationError},
};

/// Extension trait for Result types to simplify database error mapping
///
/// The underlying driver error is logged with its full detail, while the returned
/// [`StorageError::Database`] only carries the caller supplied context. This keeps
/// connection strings and SQL fragments out of errors that may reach a client.
///
/// # Example
///
/// ```rust,ignore
/// use yap_auth_core::error::utilities::DatabaseResultExt;
///
/// query.execute(&pool).await.map_db_err("Failed to create user")?;
/// ```
pub trait DatabaseResultExt<T> {
    /// Log the error and convert it to a storage error with the given context
    fn map_db_err(self, context: &str) -> Result<T, Error>;
}

impl<T, E: std::fmt::Display> DatabaseResultExt<T> for Result<T, E> {
    fn map_db_err(self, context: &str) -> Result<T, Error> {
        self.map_err(|e| {
            tracing::error!(error = %e, "{context}");
            Error::Storage(StorageError::Database(context.to_string()))
        })
    }
}

/// Extension trait for Option types to simplify required field validation
///
/// # Example
///
/// ```rust
/// use yap_auth_core::error::utilities::RequiredFieldExt;
///
/// let email: Option<String> = Some("user@example.com".to_string());
/// let email = email.require_field("email").unwrap();
/// assert_eq!(email, "user@example.com");
/// ```
pub trait RequiredFieldExt<T> {
    /// Convert None to a ValidationError::MissingField
    fn require_field(self, field_name: &str) -> Result<T, ValidationError>;
}

impl<T> RequiredFieldExt<T> for Option<T> {
    fn require_field(self, field_name: &str) -> Result<T, ValidationError> {
        self.ok_or_else(|| ValidationError::MissingField(format!("{field_name} is required")))
    }
}
