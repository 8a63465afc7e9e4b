//! Organization endpoint handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{podio_error, SharedState};

/// Query parameters for `GET /org/url`.
#[derive(Debug, Deserialize)]
pub struct OrgUrlQuery {
    pub url: String,
}

/// GET /org/
pub async fn list_orgs(State(state): State<SharedState>) -> Response {
    let state = state.read().await;
    let orgs: Vec<_> = state.orgs.values().cloned().collect();
    (StatusCode::OK, Json(orgs)).into_response()
}

/// GET /org/url
pub async fn get_org_by_url(
    State(state): State<SharedState>,
    Query(query): Query<OrgUrlQuery>,
) -> Response {
    let state = state.read().await;
    match state.org_by_url(&query.url) {
        Some(org) => (StatusCode::OK, Json(org.clone())).into_response(),
        None => podio_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("No organization found at {}", query.url),
        ),
    }
}
