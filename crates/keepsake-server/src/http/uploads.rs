// SPDX-License-Identifier: Apache-2.0

use crate::http::response_contract::{error_response, ERR_NOT_FOUND};
use crate::AppState;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use keepsake_model::{extension_of, image_mime_type};
use keepsake_store::{PendingUpload, UploadFields, UploadPayload};
use tracing::warn;

/// Everything one multipart upload form carried.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub action: Option<String>,
    pub fields: UploadFields,
    pub files: Vec<PendingUpload>,
}

fn is_file_field(name: &str) -> bool {
    matches!(name, "file" | "files" | "files[]")
}

async fn read_file_field(field: Field<'_>) -> PendingUpload {
    let file_name = field.file_name().unwrap_or_default().to_string();
    match field.bytes().await {
        Ok(bytes) if file_name.is_empty() && bytes.is_empty() => PendingUpload {
            file_name,
            payload: UploadPayload::Failed("no file selected".to_string()),
        },
        Ok(bytes) => PendingUpload::from_bytes(file_name, bytes.to_vec()),
        Err(e) => PendingUpload {
            file_name,
            payload: UploadPayload::Failed(e.to_string()),
        },
    }
}

/// Reads the whole form. A broken stream stops reading; files read so far are kept.
pub(crate) async fn read_upload_form(mut multipart: Multipart) -> UploadForm {
    let mut form = UploadForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("multipart stream ended early: {e}");
                break;
            }
        };
        let name = field.name().unwrap_or_default().to_string();
        if is_file_field(&name) {
            form.files.push(read_file_field(field).await);
            continue;
        }
        let value = match field.text().await {
            Ok(value) => value,
            Err(e) => {
                warn!(field = %name, "unreadable form field: {e}");
                continue;
            }
        };
        match name.as_str() {
            "action" => form.action = Some(value),
            "tag" => form.fields.tag = Some(value),
            "captionText" => form.fields.caption_text = Some(value),
            "alt" => form.fields.alt = Some(value),
            _ => {}
        }
    }
    form
}

pub(crate) async fn uploaded_file_handler(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Response {
    let Some(path) = state.layout.resolve_public_file(&file) else {
        return error_response(StatusCode::NOT_FOUND, ERR_NOT_FOUND);
    };
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(_) => return error_response(StatusCode::NOT_FOUND, ERR_NOT_FOUND),
    };
    let content_type =
        image_mime_type(&extension_of(&file)).unwrap_or("application/octet-stream");
    let mut resp = (StatusCode::OK, bytes).into_response();
    resp.headers_mut()
        .insert("content-type", HeaderValue::from_static(content_type));
    resp
}
