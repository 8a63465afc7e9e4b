//! File endpoint handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{not_found, podio_error, SharedState};
use crate::mock_server::fixtures::record;

/// Query parameters for `GET /file/space/{space_id}`.
#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    pub attached_to: Option<String>,
    pub filetype: Option<String>,
    pub hosted_by: Option<String>,
    pub sort_by: Option<String>,
    pub sort_desc: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// POST /file
///
/// Expects a `filename` text field and a `source` file part.
pub async fn upload_file(State(state): State<SharedState>, mut multipart: Multipart) -> Response {
    let mut filename = None;
    let mut content = None;
    let mut mimetype = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return podio_error(StatusCode::BAD_REQUEST, "invalid_request", e.to_string()),
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("filename") => filename = field.text().await.ok(),
            Some("source") => {
                mimetype = field.content_type().map(str::to_string);
                content = field.bytes().await.ok();
            }
            _ => {}
        }
    }

    let (Some(filename), Some(content)) = (filename, content) else {
        return podio_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "Both filename and source are required",
        );
    };

    let mut state = state.write().await;
    let file_id = state.next_id();
    let file = record(json!({
        "file_id": file_id,
        "name": filename,
        "mimetype": mimetype.unwrap_or_else(|| "application/octet-stream".to_string()),
        "size": content.len(),
        "hosted_by": "podio",
        "link": format!("https://files.podio.com/{file_id}"),
    }));
    state.files.insert(file_id, file.clone());

    (StatusCode::OK, Json(file)).into_response()
}

/// GET /file/{file_id}
pub async fn get_file(State(state): State<SharedState>, Path(file_id): Path<u64>) -> Response {
    let state = state.read().await;
    match state.files.get(&file_id) {
        Some(file) => (StatusCode::OK, Json(file.clone())).into_response(),
        None => not_found("File", file_id),
    }
}

/// POST /file/{file_id}/copy
pub async fn copy_file(State(state): State<SharedState>, Path(file_id): Path<u64>) -> Response {
    let mut state = state.write().await;
    let Some(original) = state.files.get(&file_id).cloned() else {
        return not_found("File", file_id);
    };

    let new_id = state.next_id();
    let mut copy = original;
    copy.insert("file_id".to_string(), new_id.into());
    copy.remove("space_id");
    state.files.insert(new_id, copy);

    (StatusCode::OK, Json(json!({"file_id": new_id}))).into_response()
}

/// GET /file/space/{space_id}
pub async fn list_space_files(
    State(state): State<SharedState>,
    Path(space_id): Path<u64>,
    Query(query): Query<ListFilesQuery>,
) -> Response {
    let state = state.read().await;
    if !state.spaces.contains_key(&space_id) {
        return not_found("Space", space_id);
    }

    let mut files: Vec<_> = state
        .files_in_space(space_id)
        .into_iter()
        .filter(|f| matches_filter(f.get("hosted_by"), query.hosted_by.as_deref()))
        .filter(|f| {
            let kind = f
                .get("mimetype")
                .and_then(Value::as_str)
                .and_then(|m| m.split('/').next());
            query.filetype.as_deref().map_or(true, |want| kind == Some(want))
        })
        .cloned()
        .collect();

    let sort_key = query.sort_by.as_deref().unwrap_or("name").to_string();
    files.sort_by(|a, b| {
        let a = a.get(&sort_key).and_then(Value::as_str).unwrap_or_default();
        let b = b.get(&sort_key).and_then(Value::as_str).unwrap_or_default();
        a.cmp(b)
    });
    if query.sort_desc.unwrap_or(true) {
        files.reverse();
    }

    let page: Vec<_> = files
        .into_iter()
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(20))
        .collect();
    (StatusCode::OK, Json(page)).into_response()
}

fn matches_filter(value: Option<&Value>, wanted: Option<&str>) -> bool {
    match wanted {
        Some(wanted) => value.and_then(Value::as_str) == Some(wanted),
        None => true,
    }
}
