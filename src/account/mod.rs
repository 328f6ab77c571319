mod error;
mod repository;
mod service;

pub use error::*;
pub use repository::*;
pub use service::*;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Account as exposed to callers. Carries no secret material.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow,
)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Fields required to open an account.
#[derive(Default, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct NewAccount {
    pub username: Option<String>,
    #[serde(alias = "password")]
    pub secret: Option<String>,
    pub email: Option<String>,
}

/// Fields targeted by an update. Absent fields are left untouched.
#[derive(Default, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct AccountChanges {
    pub username: Option<String>,
    #[serde(alias = "password")]
    pub secret: Option<String>,
    pub email: Option<String>,
}

impl AccountChanges {
    /// Update `username` of [`AccountChanges`].
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Update `secret` of [`AccountChanges`].
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Update `email` of [`AccountChanges`].
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Username and secret pair to check.
#[derive(Default, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub username: Option<String>,
    #[serde(alias = "password")]
    pub secret: Option<String>,
}

// Secrets must never reach logs, even through `?body` in a span.
impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AccountChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountChanges")
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("email", &self.email)
            .finish()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Keep the value only if it carries something.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
