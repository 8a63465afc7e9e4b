//! App and item endpoint handlers.

use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{not_found, podio_error, SharedState};
use crate::mock_server::fixtures::record;
use crate::Record;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Body of `POST /app/{app_id}/install`.
#[derive(Debug, Deserialize)]
pub struct InstallBody {
    pub space_id: u64,
}

/// Body of `POST /item/app/{app_id}/filter/`.
#[derive(Debug, Deserialize)]
pub struct FilterBody {
    #[serde(default = "default_filter_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    pub sort_desc: Option<bool>,
}

fn default_filter_limit() -> usize {
    30
}

/// Body of `POST /item/app/{app_id}`.
#[derive(Debug, Deserialize)]
pub struct CreateItemBody {
    #[serde(default)]
    pub fields: Record,
    pub external_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// GET /app/{app_id}
pub async fn get_app(State(state): State<SharedState>, Path(app_id): Path<u64>) -> Response {
    let state = state.read().await;
    match state.apps.get(&app_id) {
        Some(app) => (StatusCode::OK, Json(app.clone())).into_response(),
        None => not_found("App", app_id),
    }
}

/// GET /app/space/{space_id}
///
/// Returns abbreviated records, like the real endpoint.
pub async fn list_space_apps(State(state): State<SharedState>, Path(space_id): Path<u64>) -> Response {
    let state = state.read().await;
    if !state.spaces.contains_key(&space_id) {
        return not_found("Space", space_id);
    }

    let apps: Vec<Value> = state
        .apps_in_space(space_id)
        .into_iter()
        .map(|app| {
            json!({
                "app_id": app.get("app_id"),
                "config": {"name": app.get("config").and_then(|c| c.get("name"))},
            })
        })
        .collect();
    (StatusCode::OK, Json(apps)).into_response()
}

/// POST /app/{app_id}/install
pub async fn install_app(
    State(state): State<SharedState>,
    Path(app_id): Path<u64>,
    Json(body): Json<InstallBody>,
) -> Response {
    let mut state = state.write().await;
    let Some(original) = state.apps.get(&app_id).cloned() else {
        return not_found("App", app_id);
    };
    if !state.spaces.contains_key(&body.space_id) {
        return not_found("Space", body.space_id);
    }

    let new_id = state.next_id();
    let mut copy = original;
    copy.insert("app_id".to_string(), new_id.into());
    copy.insert("space_id".to_string(), body.space_id.into());
    state.apps.insert(new_id, copy);

    (StatusCode::OK, Json(json!({"app_id": new_id}))).into_response()
}

/// POST /item/app/{app_id}
pub async fn create_item(
    State(state): State<SharedState>,
    Path(app_id): Path<u64>,
    Json(body): Json<CreateItemBody>,
) -> Response {
    let mut state = state.write().await;
    if !state.apps.contains_key(&app_id) {
        return not_found("App", app_id);
    }

    for (field, value) in &body.fields {
        if let Some(embed_id) = value.get("embed").and_then(Value::as_u64) {
            if !state.embeds.contains_key(&embed_id) {
                return podio_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_value",
                    format!("Unknown embed {embed_id} on field {field}"),
                );
            }
        }
    }

    let item_id = state.next_id();
    let title = body
        .fields
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("Untitled")
        .to_string();
    let item = record(json!({
        "item_id": item_id,
        "app_id": app_id,
        "app_item_id": item_id,
        "title": title,
        "fields": body.fields,
        "external_id": body.external_id,
        "tags": body.tags,
        "link": format!("https://podio.com/item/{item_id}"),
    }));
    state.items.insert(item_id, item.clone());

    (StatusCode::OK, Json(item)).into_response()
}

/// POST /item/app/{app_id}/filter/
pub async fn filter_items(
    State(state): State<SharedState>,
    Path(app_id): Path<u64>,
    Json(body): Json<FilterBody>,
) -> Response {
    let state = state.read().await;
    if !state.apps.contains_key(&app_id) {
        return not_found("App", app_id);
    }

    let mut items = state.items_in_app(app_id);
    if body.sort_desc == Some(true) {
        items.reverse();
    }
    let total = items.len();
    let page: Vec<_> = items
        .into_iter()
        .skip(body.offset)
        .take(body.limit)
        .cloned()
        .collect();

    (
        StatusCode::OK,
        Json(json!({"total": total, "filtered": total, "items": page})),
    )
        .into_response()
}

/// GET /item/app/{app_id}/xlsx
///
/// The body is a stand-in: the zip magic followed by one line per item.
pub async fn export_items(State(state): State<SharedState>, Path(app_id): Path<u64>) -> Response {
    let state = state.read().await;
    if !state.apps.contains_key(&app_id) {
        return not_found("App", app_id);
    }

    let mut body = b"PK\x03\x04".to_vec();
    for item in state.items_in_app(app_id) {
        if let Some(title) = item.get("title").and_then(Value::as_str) {
            body.extend_from_slice(title.as_bytes());
            body.push(b'\n');
        }
    }

    (StatusCode::OK, [(CONTENT_TYPE, XLSX_CONTENT_TYPE)], body).into_response()
}
