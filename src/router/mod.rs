pub mod accounts;
pub mod login;
pub mod status;

use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::ServerError;

/// JSON body whose rejection is reported as a [`ServerError`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ServerError))]
pub struct Payload<T>(pub T);

/// Path parameter whose rejection is reported as a [`ServerError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ServerError))]
pub struct Param<T>(pub T);

/// Plain confirmation.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn state() -> crate::AppState {
    use std::sync::Arc;

    use crate::account::{AccountRepository, AccountService};
    use crate::config::Configuration;
    use crate::crypto::PasswordManager;
    use crate::database::Database;

    let db = Database::in_memory().await.expect("in-memory sqlite");
    let pwd = PasswordManager::new(&crate::crypto::tests::config())
        .expect("argon2 parameters");

    crate::AppState {
        config: Arc::new(Configuration::default()),
        accounts: AccountService::new(
            AccountRepository::new(db.sqlite.clone()),
            Arc::new(pwd),
        ),
        db,
        metrics: None,
    }
}
