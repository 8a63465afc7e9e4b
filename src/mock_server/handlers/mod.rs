//! HTTP request handlers for the mock server.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;

pub mod apps;
pub mod auth;
pub mod files;
pub mod orgs;
pub mod spaces;
pub mod widgets;

pub use apps::*;
pub use auth::*;
pub use files::*;
pub use orgs::*;
pub use spaces::*;
pub use widgets::*;

pub type SharedState = Arc<RwLock<MockState>>;

/// Podio-shaped error body.
pub fn podio_error(status: StatusCode, error: &str, description: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": error,
            "error_description": description.into(),
        })),
    )
        .into_response()
}

pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Response {
    podio_error(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("{kind} with id {id} not found"),
    )
}

/// Reject API calls without a valid `Authorization: OAuth2 <token>` header.
pub async fn require_token(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("OAuth2 "))
        .map(str::to_string);

    let authorized = match token {
        Some(token) => state.read().await.access_tokens.contains(&token),
        None => false,
    };

    if authorized {
        next.run(request).await
    } else {
        podio_error(StatusCode::UNAUTHORIZED, "unauthorized", "expired_token")
    }
}
