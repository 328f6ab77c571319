use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::account::{AccountService, Credentials};
use crate::error::Result;
use crate::router::Payload;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub authenticated: bool,
}

/// Handler to check credentials.
///
/// Unknown username is `404`, a wrong secret `401`.
pub async fn handler(
    State(accounts): State<AccountService>,
    Payload(body): Payload<Credentials>,
) -> Result<(StatusCode, Json<Response>)> {
    let authenticated = accounts.verify_credentials(body).await?;
    let status = if authenticated {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };

    Ok((status, Json(Response { authenticated })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::json;

    use super::Response;
    use crate::*;

    async fn login(
        app: &axum::Router,
        username: &str,
        secret: &str,
    ) -> axum::http::Response<axum::body::Body> {
        make_request(
            app.clone(),
            Method::POST,
            "/login",
            json!({ "username": username, "secret": secret }).to_string(),
        )
        .await
    }

    async fn authenticated(response: axum::http::Response<axum::body::Body>) -> bool {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice::<Response>(&body).unwrap().authenticated
    }

    #[tokio::test]
    async fn test_account_lifecycle() {
        let app = app(router::state().await);

        let response = make_request(
            app.clone(),
            Method::POST,
            "/accounts",
            json!({ "username": "alice", "secret": "p@ss1", "email": "a@x.io" })
                .to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = login(&app, "alice", "wrong").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!authenticated(response).await);

        let response = login(&app, "alice", "p@ss1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(authenticated(response).await);

        let response =
            make_request(app.clone(), Method::DELETE, "/accounts/1", String::new())
                .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response =
            make_request(app.clone(), Method::GET, "/accounts/1", String::new())
                .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = login(&app, "alice", "p@ss1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_validation() {
        let app = app(router::state().await);

        let response = make_request(
            app,
            Method::POST,
            "/login",
            json!({ "username": "alice" }).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
