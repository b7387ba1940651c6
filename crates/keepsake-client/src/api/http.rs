// SPDX-License-Identifier: Apache-2.0

use super::{newest_first, GalleryApi, UploadFile, UploadOptions};
use crate::error::{ClientError, ClientErrorCode};
use async_trait::async_trait;
use keepsake_model::{ItemPatch, PublicItem};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const API_PATH: &str = "api/index.php";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    items: Option<Vec<PublicItem>>,
    #[serde(default)]
    item: Option<PublicItem>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    id: &'a str,
    #[serde(flatten)]
    patch: &'a ItemPatch,
}

/// Talks to a keepsake server over its JSON API.
#[derive(Debug, Clone)]
pub struct HttpGalleryApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGalleryApi {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{API_PATH}?action={action}", self.base_url)
    }

    /// Absolute URL for an item's relative `src`.
    #[must_use]
    pub fn resolve_src(&self, src: &str) -> String {
        if src.starts_with("http://") || src.starts_with("https://") || src.starts_with("data:") {
            return src.to_string();
        }
        format!("{}/{}", self.base_url, src.trim_start_matches('/'))
    }

    async fn decode(resp: reqwest::Response) -> Result<Envelope, ClientError> {
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| {
            ClientError::new(ClientErrorCode::Network, format!("read body failed: {e}"))
        })?;
        let envelope: Result<Envelope, _> = serde_json::from_slice(&bytes);
        match envelope {
            Ok(env) if status.is_success() && env.ok => Ok(env),
            Ok(env) => Err(status_error(status, env.error.as_deref())),
            Err(e) if status.is_success() => Err(ClientError::new(
                ClientErrorCode::Decode,
                format!("unexpected response body: {e}"),
            )),
            Err(_) => Err(status_error(status, None)),
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Envelope, ClientError> {
        let resp = req.send().await.map_err(|e| {
            warn!("gallery request failed: {e}");
            ClientError::new(ClientErrorCode::Network, format!("request failed: {e}"))
        })?;
        Self::decode(resp).await.inspect_err(|e| {
            warn!(code = e.code.as_str(), "gallery request rejected: {}", e.message);
        })
    }
}

fn status_error(status: StatusCode, error: Option<&str>) -> ClientError {
    let message = error.unwrap_or("request failed").to_string();
    let code = match status {
        StatusCode::NOT_FOUND if message == "Not found" => ClientErrorCode::NotFound,
        s if s.is_server_error() => ClientErrorCode::Storage,
        _ => ClientErrorCode::Rejected,
    };
    ClientError::new(code, format!("{message} (status {})", status.as_u16()))
}

fn missing(field: &str) -> ClientError {
    ClientError::new(
        ClientErrorCode::Decode,
        format!("response is missing `{field}`"),
    )
}

#[async_trait]
impl GalleryApi for HttpGalleryApi {
    #[instrument(name = "gallery_http_list", skip(self), fields(base = %self.base_url))]
    async fn list(&self) -> Result<Vec<PublicItem>, ClientError> {
        let env = self.send(self.client.get(self.endpoint("list"))).await?;
        let mut items = env.items.ok_or_else(|| missing("items"))?;
        newest_first(&mut items);
        debug!(count = items.len(), "listed items");
        Ok(items)
    }

    #[instrument(name = "gallery_http_upload", skip(self, files, options), fields(files = files.len()))]
    async fn upload(
        &self,
        files: Vec<UploadFile>,
        options: &UploadOptions,
    ) -> Result<Vec<PublicItem>, ClientError> {
        if files.is_empty() {
            return Err(ClientError::new(ClientErrorCode::Rejected, "No files"));
        }
        let mut form = Form::new().text("tag", options.tag.to_string());
        if let Some(caption) = &options.caption_text {
            form = form.text("captionText", caption.clone());
        }
        if let Some(alt) = &options.alt {
            form = form.text("alt", alt.clone());
        }
        for file in files {
            form = form.part("files[]", Part::bytes(file.bytes).file_name(file.file_name));
        }
        let env = self
            .send(self.client.post(self.endpoint("upload")).multipart(form))
            .await?;
        env.items.ok_or_else(|| missing("items"))
    }

    async fn update(&self, id: &str, patch: &ItemPatch) -> Result<PublicItem, ClientError> {
        let body = UpdateBody { id, patch };
        let env = self
            .send(self.client.post(self.endpoint("update")).json(&body))
            .await?;
        env.item.ok_or_else(|| missing("item"))
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let body = serde_json::json!({ "id": id });
        self.send(self.client.post(self.endpoint("delete")).json(&body))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_the_base() {
        let api = HttpGalleryApi::new("http://127.0.0.1:8080/");
        assert_eq!(
            api.endpoint("list"),
            "http://127.0.0.1:8080/api/index.php?action=list"
        );
        assert_eq!(
            api.resolve_src("images/uploads/a.png"),
            "http://127.0.0.1:8080/images/uploads/a.png"
        );
        assert_eq!(api.resolve_src("data:image/png;base64,AA"), "data:image/png;base64,AA");
    }

    #[test]
    fn statuses_map_to_error_codes() {
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, Some("Not found")).code,
            ClientErrorCode::NotFound
        );
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, Some("Unsupported route")).code,
            ClientErrorCode::Rejected
        );
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, Some("Missing id")).code,
            ClientErrorCode::Rejected
        );
        assert_eq!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, None).code,
            ClientErrorCode::Storage
        );
    }

    #[test]
    fn update_body_flattens_the_patch() {
        let patch = ItemPatch::caption("Hi");
        let body = serde_json::to_value(UpdateBody { id: "img_1", patch: &patch }).expect("json");
        assert_eq!(body, serde_json::json!({"id": "img_1", "captionText": "Hi"}));
    }
}
