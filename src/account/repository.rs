//! Handle database requests.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::account::Account;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint failed on `{field}`")]
    Conflict { field: &'static str },
    #[error("update requires at least one field")]
    EmptyFieldSet,
    #[error(transparent)]
    Sql(#[from] sqlx::Error),
}

/// Turn SQLite unique violations into [`StoreError::Conflict`].
fn constraint(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            // SQLite reports `UNIQUE constraint failed: accounts.<column>`.
            let message = db_err.message();
            let field = [Column::Username, Column::Email]
                .into_iter()
                .find(|column| message.ends_with(&format!("accounts.{column}")))
                .map(Column::name)
                .unwrap_or("account");

            return StoreError::Conflict { field };
        }
    }

    StoreError::Sql(err)
}

/// Writable columns of `accounts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Username,
    SecretHash,
    Email,
}

impl Column {
    fn name(self) -> &'static str {
        match self {
            Column::Username => "username",
            Column::SecretHash => "secret_hash",
            Column::Email => "email",
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Columns to overwrite and their new values.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldSet {
    pub username: Option<String>,
    pub secret_hash: Option<String>,
    pub email: Option<String>,
}

impl FieldSet {
    pub fn is_empty(&self) -> bool {
        self.columns().next().is_none()
    }

    /// Present columns, in a stable order.
    pub fn columns(&self) -> impl Iterator<Item = (Column, &str)> {
        [
            (Column::Username, self.username.as_deref()),
            (Column::SecretHash, self.secret_hash.as_deref()),
            (Column::Email, self.email.as_deref()),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
    }
}

/// Account persistence.
#[derive(Clone, Debug)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Create a new [`AccountRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new account and return its identifier.
    pub async fn insert(
        &self,
        username: &str,
        secret_hash: &str,
        email: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"INSERT INTO accounts (username, secret_hash, email) VALUES (?, ?, ?)"#,
        )
        .bind(username)
        .bind(secret_hash)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(constraint)?;

        Ok(result.last_insert_rowid())
    }

    /// Find account using `id` field.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        Ok(sqlx::query_as::<_, Account>(
            r#"SELECT id, username, email FROM accounts WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Snapshot of every account, oldest first.
    pub async fn list(&self) -> Result<Vec<Account>> {
        Ok(sqlx::query_as::<_, Account>(
            r#"SELECT id, username, email FROM accounts ORDER BY id ASC"#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Overwrite exactly the columns present in `fields`, in one statement.
    ///
    /// Returns affected rows, `0` when no account has this `id`.
    pub async fn update_fields(&self, id: i64, fields: &FieldSet) -> Result<u64> {
        if fields.is_empty() {
            return Err(StoreError::EmptyFieldSet);
        }

        let mut query = QueryBuilder::<Sqlite>::new("UPDATE accounts SET ");
        let mut set = query.separated(", ");
        for (column, value) in fields.columns() {
            set.push(format!("{column} = "));
            set.push_bind_unseparated(value.to_owned());
        }
        query.push(" WHERE id = ").push_bind(id);

        let result = query
            .build()
            .execute(&self.pool)
            .await
            .map_err(constraint)?;

        Ok(result.rows_affected())
    }

    /// Delete account. Returns affected rows.
    pub async fn delete(&self, id: i64) -> Result<u64> {
        let result = sqlx::query(r#"DELETE FROM accounts WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Stored hash for `username`, if the account exists.
    pub async fn secret_hash_by_username(
        &self,
        username: &str,
    ) -> Result<Option<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            r#"SELECT secret_hash FROM accounts WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    async fn repo() -> AccountRepository {
        let db = Database::in_memory().await.unwrap();
        AccountRepository::new(db.sqlite)
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let repo = repo().await;

        let first = repo.insert("alice", "hash-a", "a@x.io").await.unwrap();
        let second = repo.insert("bob", "hash-b", "b@x.io").await.unwrap();
        assert_eq!(first, 1);
        assert!(second > first);

        let listed = repo.list().await.unwrap();
        assert_eq!(
            listed.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![first, second]
        );
    }

    #[tokio::test]
    async fn test_insert_conflicts() {
        let repo = repo().await;
        repo.insert("alice", "hash", "a@x.io").await.unwrap();

        assert!(matches!(
            repo.insert("alice", "hash", "other@x.io").await,
            Err(StoreError::Conflict { field: "username" })
        ));
        assert!(matches!(
            repo.insert("bob", "hash", "a@x.io").await,
            Err(StoreError::Conflict { field: "email" })
        ));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_and_secret_lookup() {
        let repo = repo().await;
        let id = repo.insert("alice", "hash", "a@x.io").await.unwrap();

        let account = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.email, "a@x.io");
        assert!(repo.find_by_id(id + 1).await.unwrap().is_none());

        assert_eq!(
            repo.secret_hash_by_username("alice").await.unwrap().as_deref(),
            Some("hash")
        );
        assert!(repo.secret_hash_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_only_given_columns() {
        let repo = repo().await;
        let id = repo.insert("alice", "hash", "a@x.io").await.unwrap();

        let fields = FieldSet {
            email: Some("new@x.io".into()),
            ..Default::default()
        };
        assert_eq!(repo.update_fields(id, &fields).await.unwrap(), 1);

        let account = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.email, "new@x.io");
        assert_eq!(
            repo.secret_hash_by_username("alice").await.unwrap().as_deref(),
            Some("hash")
        );

        let fields = FieldSet {
            username: Some("alicia".into()),
            secret_hash: Some("hash2".into()),
            email: Some("alicia@x.io".into()),
        };
        assert_eq!(repo.update_fields(id, &fields).await.unwrap(), 1);
        assert_eq!(
            repo.secret_hash_by_username("alicia").await.unwrap().as_deref(),
            Some("hash2")
        );
    }

    #[tokio::test]
    async fn test_update_missing_and_empty() {
        let repo = repo().await;

        let fields = FieldSet {
            username: Some("ghost".into()),
            ..Default::default()
        };
        assert_eq!(repo.update_fields(42, &fields).await.unwrap(), 0);
        assert!(matches!(
            repo.update_fields(42, &FieldSet::default()).await,
            Err(StoreError::EmptyFieldSet)
        ));
    }

    #[tokio::test]
    async fn test_update_conflict_is_atomic() {
        let repo = repo().await;
        repo.insert("alice", "hash", "a@x.io").await.unwrap();
        let bob = repo.insert("bob", "hash", "b@x.io").await.unwrap();

        // `username` is fine on its own, `email` clashes: nothing is written.
        let fields = FieldSet {
            username: Some("robert".into()),
            email: Some("a@x.io".into()),
            ..Default::default()
        };
        assert!(matches!(
            repo.update_fields(bob, &fields).await,
            Err(StoreError::Conflict { field: "email" })
        ));

        let account = repo.find_by_id(bob).await.unwrap().unwrap();
        assert_eq!(account.username, "bob");
        assert_eq!(account.email, "b@x.io");
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let id = repo.insert("alice", "hash", "a@x.io").await.unwrap();

        assert_eq!(repo.delete(id).await.unwrap(), 1);
        assert_eq!(repo.delete(id).await.unwrap(), 0);
        assert!(repo.find_by_id(id).await.unwrap().is_none());
    }

    #[test]
    fn test_field_set_columns() {
        let fields = FieldSet {
            username: Some("alice".into()),
            email: Some("a@x.io".into()),
            ..Default::default()
        };

        assert_eq!(
            fields.columns().collect::<Vec<_>>(),
            vec![(Column::Username, "alice"), (Column::Email, "a@x.io")]
        );
        assert!(FieldSet::default().is_empty());
    }
}
