use std::sync::Arc;

use axum::extract::FromRef;

use crate::AppState;
use crate::account::error::{missing, none_of};
use crate::account::{
    Account, AccountChanges, AccountError, AccountRepository, Credentials,
    FieldSet, NewAccount, Result, StoreError, ToInternal, present,
};
use crate::crypto::PasswordManager;

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { field } => AccountError::Conflict { field },
            err => AccountError::internal(err),
        }
    }
}

/// Account manager.
///
/// Every operation is one validation step, at most one hash, and one store
/// statement.
#[derive(Clone)]
pub struct AccountService {
    repo: AccountRepository,
    pwd: Arc<PasswordManager>,
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(repo: AccountRepository, pwd: Arc<PasswordManager>) -> Self {
        Self { repo, pwd }
    }

    /// Hash the secret then save the account.
    pub async fn create_account(&self, account: NewAccount) -> Result<Account> {
        let (username, secret, email) = (
            present(&account.username),
            present(&account.secret),
            present(&account.email),
        );
        let (Some(username), Some(secret), Some(email)) = (username, secret, email)
        else {
            return Err(missing(&[
                ("username", username),
                ("secret", secret),
                ("email", email),
            ])
            .into());
        };

        let secret_hash = self.pwd.hash(secret.to_owned()).await?;
        let id = self
            .repo
            .insert(username, &secret_hash, email)
            .await
            .inspect_err(|err| {
                tracing::warn!(%username, error = %err, "account not created")
            })?;

        tracing::info!(account_id = id, %username, "account created");

        Ok(Account {
            id,
            username: username.to_owned(),
            email: email.to_owned(),
        })
    }

    /// Find account using `id` field.
    pub async fn get_account(&self, id: i64) -> Result<Account> {
        self.repo.find_by_id(id).await?.ok_or(AccountError::NotFound)
    }

    /// Every account, oldest first.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.repo.list().await.catch()
    }

    /// Apply the supplied fields only. A new secret is hashed before being
    /// written.
    pub async fn update_account(
        &self,
        id: i64,
        changes: AccountChanges,
    ) -> Result<()> {
        let (username, secret, email) = (
            present(&changes.username),
            present(&changes.secret),
            present(&changes.email),
        );
        if username.is_none() && secret.is_none() && email.is_none() {
            return Err(none_of(&["username", "secret", "email"]).into());
        }

        let secret_hash = match secret {
            Some(secret) => Some(self.pwd.hash(secret.to_owned()).await?),
            None => None,
        };
        let fields = FieldSet {
            username: username.map(str::to_owned),
            secret_hash,
            email: email.map(str::to_owned),
        };

        match self.repo.update_fields(id, &fields).await? {
            0 => Err(AccountError::NotFound),
            _ => {
                let columns: Vec<_> =
                    fields.columns().map(|(column, _)| column).collect();
                tracing::info!(account_id = id, ?columns, "account updated");
                Ok(())
            },
        }
    }

    /// Delete account permanently.
    pub async fn delete_account(&self, id: i64) -> Result<()> {
        match self.repo.delete(id).await? {
            0 => Err(AccountError::NotFound),
            _ => {
                tracing::info!(account_id = id, "account deleted");
                Ok(())
            },
        }
    }

    /// Check a secret against the account registered under `username`.
    ///
    /// A wrong secret is `Ok(false)`, an unknown username is
    /// [`AccountError::NotFound`].
    pub async fn verify_credentials(
        &self,
        credentials: Credentials,
    ) -> Result<bool> {
        let (username, secret) =
            (present(&credentials.username), present(&credentials.secret));
        let (Some(username), Some(secret)) = (username, secret) else {
            return Err(
                missing(&[("username", username), ("secret", secret)]).into()
            );
        };

        let secret_hash = self
            .repo
            .secret_hash_by_username(username)
            .await?
            .ok_or(AccountError::NotFound)?;

        Ok(self.pwd.verify(secret.to_owned(), secret_hash).await?)
    }
}

impl FromRef<AppState> for AccountService {
    fn from_ref(state: &AppState) -> AccountService {
        state.accounts.clone()
    }
}
