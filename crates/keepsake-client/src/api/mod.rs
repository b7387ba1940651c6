// SPDX-License-Identifier: Apache-2.0

mod http;
mod local;

pub use http::HttpGalleryApi;
pub use local::{LocalGalleryApi, LOCAL_ITEMS_KEY};

use crate::error::{ClientError, ClientErrorCode};
use async_trait::async_trait;
use keepsake_model::{ItemPatch, PublicItem, Tag};
use std::path::Path;

/// One file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                ClientError::new(
                    ClientErrorCode::Invalid,
                    format!("not a file path: {}", path.display()),
                )
            })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::storage(&format!("read {}", path.display()), &e))?;
        Ok(Self { file_name, bytes })
    }
}

/// Fields shared by every file of one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub tag: Tag,
    pub caption_text: Option<String>,
    pub alt: Option<String>,
}

impl UploadOptions {
    #[must_use]
    pub fn tagged(tag: Tag) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }
}

/// The gallery operations, served either by a keepsake server or locally.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    /// Items newest first.
    async fn list(&self) -> Result<Vec<PublicItem>, ClientError>;
    /// Created items; files the backend refuses are left out.
    async fn upload(
        &self,
        files: Vec<UploadFile>,
        options: &UploadOptions,
    ) -> Result<Vec<PublicItem>, ClientError>;
    async fn update(&self, id: &str, patch: &ItemPatch) -> Result<PublicItem, ClientError>;
    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}

pub(crate) fn newest_first(items: &mut [PublicItem]) {
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
