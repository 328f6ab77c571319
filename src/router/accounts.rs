//! Accounts-related HTTP API.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::AppState;
use crate::account::{Account, AccountChanges, AccountService, NewAccount};
use crate::error::Result;
use crate::router::{Message, Param, Payload};

pub fn router() -> Router<AppState> {
    Router::new()
        // `POST /accounts` goes to `create`, `GET /accounts` to `list`.
        .route("/", get(list).post(create))
        // `PATCH` and `PUT` both apply a partial update.
        .route("/{id}", get(read).patch(update).put(update).delete(delete))
}

/// Handler to create account.
pub async fn create(
    State(accounts): State<AccountService>,
    Payload(body): Payload<NewAccount>,
) -> Result<(StatusCode, Json<Account>)> {
    let account = accounts.create_account(body).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn list(
    State(accounts): State<AccountService>,
) -> Result<Json<Vec<Account>>> {
    Ok(Json(accounts.list_accounts().await?))
}

pub async fn read(
    State(accounts): State<AccountService>,
    Param(id): Param<i64>,
) -> Result<Json<Account>> {
    Ok(Json(accounts.get_account(id).await?))
}

pub async fn update(
    State(accounts): State<AccountService>,
    Param(id): Param<i64>,
    Payload(body): Payload<AccountChanges>,
) -> Result<Json<Message>> {
    accounts.update_account(id, body).await?;
    Ok(Json(Message::new("Account updated.")))
}

pub async fn delete(
    State(accounts): State<AccountService>,
    Param(id): Param<i64>,
) -> Result<Json<Message>> {
    accounts.delete_account(id).await?;
    Ok(Json(Message::new("Account deleted.")))
}
