// SPDX-License-Identifier: Apache-2.0

use super::{newest_first, GalleryApi, UploadFile, UploadOptions};
use crate::error::{ClientError, ClientErrorCode};
use crate::prefs::KvStore;
use async_trait::async_trait;
use base64::Engine;
use keepsake_model::{
    extension_of, image_mime_type, now_millis, stem_of, ItemId, ItemPatch, PublicItem, Tag,
    CAPTION_PREFIX,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub const LOCAL_ITEMS_KEY: &str = "keepsake-items";

/// Keeps items in a key/value store with their images inlined as data URLs.
pub struct LocalGalleryApi {
    kv: Arc<dyn KvStore>,
}

fn local_alt(file_name: &str) -> String {
    stem_of(file_name).replace(['-', '_'], " ")
}

fn local_caption(alt: &str) -> String {
    let subject = if alt.is_empty() { "us" } else { alt };
    format!("{CAPTION_PREFIX}{subject}")
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

impl LocalGalleryApi {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn load(&self) -> Result<BTreeMap<String, PublicItem>, ClientError> {
        let Some(raw) = self.kv.get(LOCAL_ITEMS_KEY)? else {
            return Ok(BTreeMap::new());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("local item table is corrupt, starting empty: {e}");
            BTreeMap::new()
        }))
    }

    fn save(&self, items: &BTreeMap<String, PublicItem>) -> Result<(), ClientError> {
        let raw = serde_json::to_string(items)
            .map_err(|e| ClientError::new(ClientErrorCode::Storage, e.to_string()))?;
        self.kv.set(LOCAL_ITEMS_KEY, &raw)
    }

    fn build_item(file: &UploadFile, options: &UploadOptions) -> Option<PublicItem> {
        let Some(mime) = image_mime_type(&extension_of(&file.file_name)) else {
            debug!(file_name = %file.file_name, "not an image, skipped");
            return None;
        };
        let alt = options
            .alt
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| local_alt(&file.file_name));
        let caption_text = options
            .caption_text
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| local_caption(&alt));
        Some(PublicItem {
            id: ItemId::generate().into_inner(),
            src: data_url(mime, &file.bytes),
            alt,
            caption_text,
            tag: options.tag.clone(),
            created_at: now_millis(),
        })
    }
}

#[async_trait]
impl GalleryApi for LocalGalleryApi {
    async fn list(&self) -> Result<Vec<PublicItem>, ClientError> {
        let mut items: Vec<PublicItem> = self.load()?.into_values().collect();
        newest_first(&mut items);
        Ok(items)
    }

    async fn upload(
        &self,
        files: Vec<UploadFile>,
        options: &UploadOptions,
    ) -> Result<Vec<PublicItem>, ClientError> {
        if files.is_empty() {
            return Err(ClientError::new(ClientErrorCode::Rejected, "No files"));
        }
        let created: Vec<PublicItem> = files
            .iter()
            .filter_map(|file| Self::build_item(file, options))
            .collect();
        if created.is_empty() {
            return Ok(created);
        }
        let mut items = self.load()?;
        for item in &created {
            items.insert(item.id.clone(), item.clone());
        }
        self.save(&items)?;
        Ok(created)
    }

    async fn update(&self, id: &str, patch: &ItemPatch) -> Result<PublicItem, ClientError> {
        let mut items = self.load()?;
        let Some(item) = items.get_mut(id) else {
            return Err(ClientError::not_found(id));
        };
        if let Some(caption) = &patch.caption_text {
            item.caption_text = caption.clone();
        }
        if let Some(tag) = &patch.tag {
            item.tag = Tag::or_default(Some(tag));
        }
        if let Some(alt) = &patch.alt {
            item.alt = alt.clone();
        }
        let updated = item.clone();
        self.save(&items)?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let mut items = self.load()?;
        if items.remove(id).is_none() {
            return Err(ClientError::not_found(id));
        }
        self.save(&items)
    }
}
