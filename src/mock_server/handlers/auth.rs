//! OAuth token endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;

use super::{podio_error, SharedState};

/// Form body of `POST /oauth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
}

/// POST /oauth/token
pub async fn token(State(state): State<SharedState>, Form(request): Form<TokenRequest>) -> Response {
    let mut state = state.write().await;
    state.token_requests.push(request.grant_type.clone());

    if request.client_id != state.client_id || request.client_secret != state.client_secret {
        return podio_error(StatusCode::UNAUTHORIZED, "invalid_client", "Invalid client");
    }

    let granted = match request.grant_type.as_str() {
        "password" => match (&request.username, &request.password) {
            (Some(user), Some(pass)) => state.users.get(user) == Some(pass),
            _ => false,
        },
        "refresh_token" => request
            .refresh_token
            .as_ref()
            .is_some_and(|t| state.refresh_tokens.contains(t)),
        other => {
            return podio_error(
                StatusCode::BAD_REQUEST,
                "unsupported_grant_type",
                format!("Grant type {other} is not supported"),
            )
        }
    };

    if !granted {
        return podio_error(StatusCode::BAD_REQUEST, "invalid_grant", "Invalid user credentials");
    }

    let n = state.token_requests.len();
    let access_token = format!("access-{n}");
    let refresh_token = format!("refresh-{n}");
    state.access_tokens.insert(access_token.clone());
    state.refresh_tokens.insert(refresh_token.clone());

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "token_type": "bearer",
            "expires_in": 28800,
        })),
    )
        .into_response()
}
