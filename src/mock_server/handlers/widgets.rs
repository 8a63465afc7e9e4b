//! Widget, flow and embed endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{not_found, podio_error, SharedState};
use crate::mock_server::fixtures::record;
use crate::{required_config, Record};

/// Body of `POST /widget/{ref_type}/{ref_id}/`.
#[derive(Debug, Deserialize)]
pub struct CreateWidgetBody {
    #[serde(rename = "type")]
    pub widget_type: String,
    pub title: String,
    #[serde(default)]
    pub config: Record,
}

/// Body of `POST /embed/`.
#[derive(Debug, Deserialize)]
pub struct CreateEmbedBody {
    pub url: String,
}

/// GET /widget/{ref_type}/{ref_id}
pub async fn list_widgets(
    State(state): State<SharedState>,
    Path((ref_type, ref_id)): Path<(String, u64)>,
) -> Response {
    let state = state.read().await;
    let widgets: Vec<_> = state
        .widgets_on(&ref_type, ref_id)
        .into_iter()
        .cloned()
        .collect();
    (StatusCode::OK, Json(widgets)).into_response()
}

/// POST /widget/{ref_type}/{ref_id}/
pub async fn create_widget(
    State(state): State<SharedState>,
    Path((ref_type, ref_id)): Path<(String, u64)>,
    Json(body): Json<CreateWidgetBody>,
) -> Response {
    let Some(required) = required_config(&body.widget_type) else {
        return podio_error(
            StatusCode::BAD_REQUEST,
            "invalid_value",
            format!("Invalid widget type {}", body.widget_type),
        );
    };
    if let Some(missing) = required.iter().find(|k| !body.config.contains_key(**k)) {
        return podio_error(
            StatusCode::BAD_REQUEST,
            "invalid_value",
            format!("Missing config property {missing}"),
        );
    }

    let mut state = state.write().await;
    let widget_id = state.next_id();
    let widget = record(json!({
        "widget_id": widget_id,
        "ref": {"type": ref_type, "id": ref_id},
        "type": body.widget_type,
        "title": body.title,
        "config": body.config,
        "rights": ["view", "update", "delete"],
    }));
    state.widgets.insert(widget_id, widget);

    (StatusCode::OK, Json(json!({"widget_id": widget_id}))).into_response()
}

/// GET /widget/{widget_id}
pub async fn get_widget(State(state): State<SharedState>, Path(widget_id): Path<u64>) -> Response {
    let state = state.read().await;
    match state.widgets.get(&widget_id) {
        Some(widget) => (StatusCode::OK, Json(widget.clone())).into_response(),
        None => not_found("Widget", widget_id),
    }
}

/// DELETE /widget/{widget_id}
pub async fn delete_widget(State(state): State<SharedState>, Path(widget_id): Path<u64>) -> Response {
    let mut state = state.write().await;
    match state.widgets.remove(&widget_id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found("Widget", widget_id),
    }
}

/// GET /flow/{ref_type}/{ref_id}/
pub async fn list_flows(
    State(state): State<SharedState>,
    Path((ref_type, ref_id)): Path<(String, u64)>,
) -> Response {
    let state = state.read().await;
    let flows: Vec<_> = state.flows_on(&ref_type, ref_id).into_iter().cloned().collect();
    (StatusCode::OK, Json(flows)).into_response()
}

/// POST /embed/
pub async fn create_embed(
    State(state): State<SharedState>,
    Json(body): Json<CreateEmbedBody>,
) -> Response {
    let mut state = state.write().await;
    let embed_id = state.next_id();
    let embed = record(json!({
        "embed_id": embed_id,
        "original_url": body.url,
        "resolved_url": body.url,
        "type": "link",
        "title": body.url,
    }));
    state.embeds.insert(embed_id, embed.clone());

    (StatusCode::OK, Json(embed)).into_response()
}
