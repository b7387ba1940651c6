// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keepsake_model::PublicItem;
use keepsake_store::{StoreError, StoreErrorCode};
use serde_json::json;

pub(crate) const ERR_NO_FILES: &str = "No files";
pub(crate) const ERR_MISSING_ID: &str = "Missing id";
pub(crate) const ERR_NOT_FOUND: &str = "Not found";
pub(crate) const ERR_UNSUPPORTED_ROUTE: &str = "Unsupported route";
pub(crate) const ERR_STORAGE: &str = "Storage failure";

#[must_use]
pub(crate) fn ok_items(items: &[PublicItem]) -> Response {
    Json(json!({"ok": true, "items": items})).into_response()
}

#[must_use]
pub(crate) fn ok_item(item: &PublicItem) -> Response {
    Json(json!({"ok": true, "item": item})).into_response()
}

#[must_use]
pub(crate) fn ok_empty() -> Response {
    Json(json!({"ok": true})).into_response()
}

#[must_use]
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"ok": false, "error": message}))).into_response()
}

#[must_use]
pub(crate) fn store_error_status(code: StoreErrorCode) -> (StatusCode, &'static str) {
    match code {
        StoreErrorCode::MissingField => (StatusCode::BAD_REQUEST, ERR_MISSING_ID),
        StoreErrorCode::NotFound => (StatusCode::NOT_FOUND, ERR_NOT_FOUND),
        StoreErrorCode::UploadRejected => (StatusCode::BAD_REQUEST, ERR_NO_FILES),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, ERR_STORAGE),
    }
}

#[must_use]
pub(crate) fn store_error_response(err: &StoreError) -> Response {
    let (status, message) = store_error_status(err.code);
    error_response(status, message)
}
