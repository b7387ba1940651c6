// SPDX-License-Identifier: Apache-2.0

use crate::http::response_contract::{
    error_response, ok_empty, ok_item, ok_items, store_error_response, ERR_MISSING_ID,
    ERR_NO_FILES, ERR_UNSUPPORTED_ROUTE,
};
use crate::http::uploads::read_upload_form;
use crate::AppState;
use axum::body::{to_bytes, Body};
use axum::extract::{FromRequest, Multipart, Query, State};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use keepsake_model::{lenient_string, ItemPatch};
use keepsake_store::{GalleryStore, StoreError, StoreErrorCode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Runs a blocking store call off the async runtime.
///
/// Mutations hold the write gate inside the blocking task, so the gate outlives a
/// cancelled request until its read-modify-write finishes.
async fn run_store<T, F>(state: &AppState, mutates: bool, op: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn GalleryStore) -> Result<T, StoreError> + Send + 'static,
{
    let guard = if mutates {
        Some(Arc::clone(&state.write_gate).lock_owned().await)
    } else {
        None
    };
    let store: Arc<dyn GalleryStore> = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        op(store.as_ref())
    })
        .await
        .map_err(|e| {
            error!("store task failed: {e}");
            StoreError::new(StoreErrorCode::Io, format!("store task failed: {e}"))
        })?
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("multipart/form-data"))
}

/// Parses a JSON body; anything that is not valid JSON reads as `null`.
async fn read_json_body(request: Request<Body>, limit: usize) -> Value {
    match to_bytes(request.into_body(), limit).await {
        Ok(bytes) => serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null),
        Err(_) => Value::Null,
    }
}

fn body_id(body: &Value) -> Option<String> {
    body.get("id")
        .and_then(lenient_string::from_value)
        .filter(|id| !id.is_empty())
}

pub(crate) async fn api_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request<Body>,
) -> Response {
    let method = request.method().clone();
    let action = params.get("action").map(String::as_str);
    match (&method, action) {
        (&Method::GET, None | Some("list")) => list(&state).await,
        (&Method::POST, Some("upload")) => upload(&state, request, false).await,
        (&Method::POST, None) if is_multipart(request.headers()) => {
            upload(&state, request, true).await
        }
        (&Method::POST, Some("update")) => update(&state, request).await,
        (&Method::POST, Some("delete")) => delete(&state, request).await,
        _ => unsupported_route_handler().await,
    }
}

async fn list(state: &AppState) -> Response {
    match run_store(state, false, |store| store.list()).await {
        Ok(items) => ok_items(&items),
        Err(e) => store_error_response(&e),
    }
}

async fn upload(state: &AppState, request: Request<Body>, action_from_form: bool) -> Response {
    if !is_multipart(request.headers()) {
        return error_response(StatusCode::BAD_REQUEST, ERR_NO_FILES);
    }
    let multipart = match Multipart::from_request(request, state).await {
        Ok(multipart) => multipart,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, ERR_NO_FILES),
    };
    let form = read_upload_form(multipart).await;
    if action_from_form && form.action.as_deref() != Some("upload") {
        return unsupported_route_handler().await;
    }
    if form.files.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, ERR_NO_FILES);
    }
    let submitted = form.files.len();
    let fields = form.fields;
    match run_store(state, true, move |store| store.upload(form.files, &fields)).await {
        Ok(items) => {
            info!(submitted, created = items.len(), "upload processed");
            ok_items(&items)
        }
        Err(e) => store_error_response(&e),
    }
}

async fn update(state: &AppState, request: Request<Body>) -> Response {
    let body = read_json_body(request, state.config.max_body_bytes).await;
    let Some(id) = body_id(&body) else {
        return error_response(StatusCode::BAD_REQUEST, ERR_MISSING_ID);
    };
    let patch: ItemPatch = serde_json::from_value(body).unwrap_or_default();
    match run_store(state, true, move |store| store.update(&id, &patch)).await {
        Ok(item) => ok_item(&item),
        Err(e) => store_error_response(&e),
    }
}

async fn delete(state: &AppState, request: Request<Body>) -> Response {
    let body = read_json_body(request, state.config.max_body_bytes).await;
    let Some(id) = body_id(&body) else {
        return error_response(StatusCode::BAD_REQUEST, ERR_MISSING_ID);
    };
    match run_store(state, true, move |store| store.delete(&id)).await {
        Ok(()) => ok_empty(),
        Err(e) => store_error_response(&e),
    }
}

pub(crate) async fn unsupported_route_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, ERR_UNSUPPORTED_ROUTE)
}

pub(crate) async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let m = state.store_metrics.snapshot();
    let mut body = String::new();
    body.push_str(&format!(
        "keepsake_store_document_writes_total {}\n",
        m.document_writes
    ));
    body.push_str(&format!(
        "keepsake_store_document_bytes_written_total {}\n",
        m.document_bytes_written
    ));
    body.push_str(&format!(
        "keepsake_store_write_latency_ms_total {}\n",
        m.write_latency_ms_total
    ));
    body.push_str(&format!("keepsake_store_files_stored_total {}\n", m.files_stored));
    body.push_str(&format!("keepsake_store_bytes_stored_total {}\n", m.bytes_stored));
    body.push_str(&format!(
        "keepsake_store_uploads_skipped_total {}\n",
        m.uploads_skipped
    ));
    for (class, count) in &m.failures_by_class {
        body.push_str(&format!(
            "keepsake_store_failures_total{{class=\"{class}\"}} {count}\n"
        ));
    }
    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    resp
}
