use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::debug;
use trellis_resolve::layout::search_trie_path;

use crate::args::{Action, BuildArgs, ResolveArgs};
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Health check handler.
pub async fn health_handler() -> &'static str {
    "OK"
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "trellis-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Resolve a node URL, or relay the bytes it points at.
pub async fn resolve_handler(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(args): Query<ResolveArgs>,
) -> ServerResult<Response> {
    let url = args.url()?.to_string();
    let build = args.build_ref()?;
    let action = args.action()?;
    debug!(repo_id = %build.repo_id, build_id = %build.build_id, %url, ?action, "resolve request");
    let pool = state.pool().clone();

    match action {
        Action::Resolve => {
            let location = blocking(move || Ok(pool.get(&build)?.resolve(&url)?)).await?;
            Ok(location.to_url().into_response())
        }
        Action::Relay => {
            let bytes = blocking(move || {
                let (_, bytes) = pool.get(&build)?.get(&url, false)?;
                Ok(bytes)
            })
            .await?;
            let cache_control = cache_control_header(&state)?;
            let mut response = if accepts_json(&headers) {
                let node: serde_json::Value = serde_json::from_slice(&bytes)?;
                Json(node).into_response()
            } else {
                octet_stream(bytes)
            };
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, cache_control);
            Ok(response)
        }
    }
}

/// Serve a build's search trie blob.
pub async fn search_blob_handler(
    State(state): State<AppState>,
    Query(args): Query<BuildArgs>,
) -> ServerResult<Response> {
    let build = args.build_ref()?;
    let store = state.pool().store().clone();
    let path = search_trie_path(&build.repo_id, &build.build_id);
    let bytes = blocking(move || Ok(store.fetch(&path, None, None, false)?.1)).await?;
    Ok(octet_stream(bytes))
}

/// Run blocking resolver or storage work off the async runtime.
async fn blocking<T, F>(work: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServerError::Internal(format!("blocking task failed: {e}")))?
}

fn cache_control_header(state: &AppState) -> ServerResult<HeaderValue> {
    HeaderValue::from_str(state.cache_control())
        .map_err(|e| ServerError::Config(format!("cache control: {e}")))
}

fn octet_stream(bytes: Vec<u8>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from(bytes),
    )
        .into_response()
}

/// True if any media range in `Accept` admits `application/json`.
fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|range| range.split(';').next().unwrap_or("").trim())
        .any(|range| matches!(range, "application/json" | "application/*" | "*/*"))
}
