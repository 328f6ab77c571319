//! Public status page.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::config::Configuration;

/// Structured status.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub name: String,
    pub version: String,
}

/// Public server status.
pub async fn status(State(config): State<Arc<Configuration>>) -> Json<Status> {
    Json(Status {
        name: config.name.clone(),
        version: config.version.clone(),
    })
}

/// Prometheus exposition, if a recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
