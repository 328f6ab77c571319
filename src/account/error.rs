//! Account-level errors.

use validator::{ValidationError, ValidationErrors};

use crate::crypto::CryptoError;

pub type Result<T> = std::result::Result<T, AccountError>;

/// Errors that can occur on account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("{field} is already taken")]
    Conflict { field: &'static str },

    #[error("account not found")]
    NotFound,

    #[error("credential hashing failed")]
    Hashing(#[from] CryptoError),

    #[error("internal server error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AccountError {
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal(Box::new(err))
    }
}

pub trait ToInternal<T> {
    fn catch(self) -> Result<T>;
}

impl<T, E> ToInternal<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn catch(self) -> Result<T> {
        self.map_err(AccountError::internal)
    }
}

/// Report every required field that is missing or empty.
pub(crate) fn missing(fields: &[(&'static str, Option<&str>)]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    for &(field, value) in fields {
        if value.is_none() {
            errors.add(
                field,
                ValidationError::new("required")
                    .with_message(format!("Missing '{field}' field.").into()),
            );
        }
    }

    errors
}

/// Nothing to do: none of the optional fields was supplied.
pub(crate) fn none_of(fields: &[&'static str]) -> ValidationErrors {
    let names = fields
        .iter()
        .map(|field| format!("'{field}'"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut errors = ValidationErrors::new();
    errors.add(
        "body",
        ValidationError::new("empty").with_message(
            format!("At least one of {names} must be provided.").into(),
        ),
    );
    errors
}
