//! Space and membership endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{not_found, podio_error, SharedState};
use crate::mock_server::fixtures::record;

/// Body of `POST /space/`.
#[derive(Debug, Deserialize)]
pub struct CreateSpaceBody {
    pub org_id: u64,
    pub name: String,
    #[serde(default = "default_privacy")]
    pub privacy: String,
    #[serde(default)]
    pub auto_join: bool,
    #[serde(default)]
    pub new_app_post: bool,
    #[serde(default)]
    pub new_member_post: bool,
}

fn default_privacy() -> String {
    "closed".to_string()
}

/// GET /space/{space_id}
pub async fn get_space(State(state): State<SharedState>, Path(space_id): Path<u64>) -> Response {
    let state = state.read().await;
    match state.spaces.get(&space_id) {
        Some(space) => (StatusCode::OK, Json(space.clone())).into_response(),
        None => not_found("Space", space_id),
    }
}

/// GET /space/org/{org_id}/
pub async fn list_org_spaces(State(state): State<SharedState>, Path(org_id): Path<u64>) -> Response {
    let state = state.read().await;
    if !state.orgs.contains_key(&org_id) {
        return not_found("Org", org_id);
    }
    let spaces: Vec<_> = state.spaces_in_org(org_id).into_iter().cloned().collect();
    (StatusCode::OK, Json(spaces)).into_response()
}

/// POST /space/
pub async fn create_space(
    State(state): State<SharedState>,
    Json(body): Json<CreateSpaceBody>,
) -> Response {
    let mut state = state.write().await;
    if !state.orgs.contains_key(&body.org_id) {
        return not_found("Org", body.org_id);
    }
    if !matches!(body.privacy.as_str(), "open" | "closed") {
        return podio_error(
            StatusCode::BAD_REQUEST,
            "invalid_value",
            format!("Invalid privacy {}", body.privacy),
        );
    }

    let space_id = state.next_id();
    let space = record(json!({
        "space_id": space_id,
        "org_id": body.org_id,
        "name": body.name,
        "url_label": body.name.to_lowercase().replace(' ', "-"),
        "privacy": body.privacy,
        "auto_join": body.auto_join,
        "post_on_new_app": body.new_app_post,
        "post_on_new_member": body.new_member_post,
        "created_on": "2024-03-05 10:00:00",
    }));
    state.spaces.insert(space_id, space);

    (
        StatusCode::OK,
        Json(json!({"space_id": space_id, "url": format!("https://podio.com/s/{space_id}")})),
    )
        .into_response()
}

/// GET /space/{space_id}/member/
pub async fn list_members(State(state): State<SharedState>, Path(space_id): Path<u64>) -> Response {
    let state = state.read().await;
    if !state.spaces.contains_key(&space_id) {
        return not_found("Space", space_id);
    }
    let members = state.members.get(&space_id).cloned().unwrap_or_default();
    (StatusCode::OK, Json(members)).into_response()
}

/// POST /space/{space_id}/member
///
/// Invited user ids become members right away.
pub async fn add_members(
    State(state): State<SharedState>,
    Path(space_id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.write().await;
    if !state.spaces.contains_key(&space_id) {
        return not_found("Space", space_id);
    }

    let role = body.get("role").and_then(Value::as_str).unwrap_or("regular");
    let user_ids: Vec<u64> = body
        .get("users")
        .and_then(Value::as_array)
        .map(|users| users.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default();

    let new_members: Vec<_> = user_ids
        .iter()
        .map(|id| record(json!({"user": {"user_id": id}, "role": role})))
        .collect();
    state.members.entry(space_id).or_default().extend(new_members);
    state.invitations.entry(space_id).or_default().push(body);

    StatusCode::NO_CONTENT.into_response()
}
