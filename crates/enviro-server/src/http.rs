//! HTTP file browser over the aggregate directory.
//!
//! - `GET /` serves the static index page
//! - `GET /get_data_files` lists aggregate files as `{"files": [...]}`
//! - `GET /enviro-data/:filename` returns one file's raw bytes, or 404

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use enviro_core::AggregateStore;
use enviro_core::storage::StorageError;
use log::error;
use serde::Serialize;

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(Clone)]
struct AppState {
    store: Arc<AggregateStore>,
}

#[derive(Serialize)]
struct DataFiles {
    files: Vec<String>,
}

pub fn routes(store: AggregateStore) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/get_data_files", get(get_data_files))
        .route("/enviro-data/:filename", get(serve_enviro_data))
        .with_state(AppState {
            store: Arc::new(store),
        })
}

fn internal_error(e: StorageError) -> (StatusCode, String) {
    error!("Storage error while serving request: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "failed to read data directory".to_string(),
    )
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some("json") => "application/json",
        Some("txt") | Some("log") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn get_data_files(
    State(state): State<AppState>,
) -> Result<Json<DataFiles>, (StatusCode, String)> {
    let files = state.store.list().await.map_err(internal_error)?;
    Ok(Json(DataFiles { files }))
}

async fn serve_enviro_data(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    match state.store.read(&filename).await.map_err(internal_error)? {
        Some(bytes) => Ok(([(header::CONTENT_TYPE, content_type_for(&filename))], bytes).into_response()),
        None => Err((StatusCode::NOT_FOUND, format!("{filename} not found"))),
    }
}
