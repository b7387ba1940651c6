// SPDX-License-Identifier: Apache-2.0

use crate::error::{StoreError, StoreErrorCode};
use crate::paths::StoreLayout;
use crate::upload::{PendingUpload, UploadFields, UploadPayload};
use keepsake_model::{
    allowed_extension, default_alt, default_caption, extension_of, now_millis, sanitize_filename,
    stem_of, ItemId, ItemPatch, MetadataDocument, PublicItem, StoredItem, Tag,
};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, UNIX_EPOCH};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub document_writes: u64,
    pub document_bytes_written: u64,
    pub write_latency_ms_total: u128,
    pub files_stored: u64,
    pub bytes_stored: u64,
    pub uploads_skipped: u64,
    pub failures_by_class: BTreeMap<String, u64>,
}

pub trait StoreInstrumentation: Send + Sync + 'static {
    fn observe_document_write(&self, _bytes: usize, _latency: Duration) {}
    fn observe_stored_file(&self, _bytes: u64) {}
    fn observe_skipped_upload(&self, _reason: &str) {}
    fn observe_error(&self, _code: StoreErrorCode) {}
}

#[derive(Default)]
pub struct NoopInstrumentation;

impl StoreInstrumentation for NoopInstrumentation {}

#[derive(Default)]
pub struct StoreMetricsCollector {
    inner: Mutex<StoreMetrics>,
}

impl StoreMetricsCollector {
    #[must_use]
    pub fn snapshot(&self) -> StoreMetrics {
        self.inner.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl StoreInstrumentation for StoreMetricsCollector {
    fn observe_document_write(&self, bytes: usize, latency: Duration) {
        if let Ok(mut m) = self.inner.lock() {
            m.document_writes = m.document_writes.saturating_add(1);
            m.document_bytes_written = m.document_bytes_written.saturating_add(bytes as u64);
            m.write_latency_ms_total = m.write_latency_ms_total.saturating_add(latency.as_millis());
        }
    }

    fn observe_stored_file(&self, bytes: u64) {
        if let Ok(mut m) = self.inner.lock() {
            m.files_stored = m.files_stored.saturating_add(1);
            m.bytes_stored = m.bytes_stored.saturating_add(bytes);
        }
    }

    fn observe_skipped_upload(&self, _reason: &str) {
        if let Ok(mut m) = self.inner.lock() {
            m.uploads_skipped = m.uploads_skipped.saturating_add(1);
        }
    }

    fn observe_error(&self, code: StoreErrorCode) {
        if let Ok(mut m) = self.inner.lock() {
            *m.failures_by_class
                .entry(code.as_str().to_string())
                .or_insert(0) += 1;
        }
    }
}

/// The four gallery operations. Implementations read the whole table per call.
pub trait GalleryStore: Send + Sync + 'static {
    /// Items whose backing file exists, newest first, ties by id ascending.
    fn list(&self) -> Result<Vec<PublicItem>, StoreError>;
    /// Stores every acceptable file and returns the created items; rejected files are skipped.
    fn upload(
        &self,
        files: Vec<PendingUpload>,
        fields: &UploadFields,
    ) -> Result<Vec<PublicItem>, StoreError>;
    fn update(&self, id: &str, patch: &ItemPatch) -> Result<PublicItem, StoreError>;
    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

pub struct LocalFsStore {
    layout: StoreLayout,
    instrumentation: Arc<dyn StoreInstrumentation>,
}

impl LocalFsStore {
    /// Opens the store and creates the uploads directory and an empty document if needed.
    pub fn open(layout: StoreLayout) -> Result<Self, StoreError> {
        let store = Self {
            layout,
            instrumentation: Arc::new(NoopInstrumentation),
        };
        store.ensure_layout()?;
        Ok(store)
    }

    pub fn open_data_root(root: &Path) -> Result<Self, StoreError> {
        Self::open(StoreLayout::under_data_root(root))
    }

    #[must_use]
    pub fn with_instrumentation(mut self, instrumentation: Arc<dyn StoreInstrumentation>) -> Self {
        self.instrumentation = instrumentation;
        self
    }

    #[must_use]
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn ensure_layout(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.layout.uploads_dir)
            .map_err(|e| self.fail(StoreError::io("create uploads directory", &e)))?;
        if !self.layout.meta_path().exists() {
            self.write_document(&MetadataDocument::default())?;
        }
        Ok(())
    }

    /// Unreadable or malformed documents read as the empty table.
    #[must_use]
    pub fn read_document(&self) -> MetadataDocument {
        match fs::read(self.layout.meta_path()) {
            Ok(raw) => MetadataDocument::from_json_bytes(&raw),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("metadata document unreadable, treating as empty: {e}");
                }
                MetadataDocument::default()
            }
        }
    }

    pub fn write_document(&self, doc: &MetadataDocument) -> Result<(), StoreError> {
        let started = Instant::now();
        let bytes = doc
            .to_json_pretty()
            .map_err(|e| self.fail(StoreError::new(StoreErrorCode::Io, e.to_string())))?;
        let tmp = self.layout.meta_tmp_path();
        fs::write(&tmp, &bytes)
            .map_err(|e| self.fail(StoreError::io("write metadata temp file", &e)))?;
        fs::rename(&tmp, self.layout.meta_path())
            .map_err(|e| self.fail(StoreError::io("replace metadata document", &e)))?;
        self.instrumentation
            .observe_document_write(bytes.len(), started.elapsed());
        debug!(entries = doc.len(), bytes = bytes.len(), "metadata document written");
        Ok(())
    }

    fn fail(&self, err: StoreError) -> StoreError {
        if err.code == StoreErrorCode::Io {
            error!("store failure: {err}");
        }
        self.instrumentation.observe_error(err.code);
        err
    }

    fn skip(&self, file_name: &str, reason: &str) -> Option<(PublicItem, PathBuf)> {
        warn!(file_name, reason, "upload skipped");
        self.instrumentation.observe_skipped_upload(reason);
        None
    }

    fn modified_millis(path: &Path) -> Option<i64> {
        let modified = fs::metadata(path).ok()?.modified().ok()?;
        let since = modified.duration_since(UNIX_EPOCH).ok()?;
        i64::try_from(since.as_millis()).ok()
    }

    fn accept_upload(
        &self,
        upload: PendingUpload,
        fields: &UploadFields,
        doc: &mut MetadataDocument,
    ) -> Option<(PublicItem, PathBuf)> {
        if let UploadPayload::Failed(reason) = &upload.payload {
            return self.skip(&upload.file_name, reason);
        }
        let original = sanitize_filename(&upload.file_name);
        let ext = extension_of(&original);
        if !allowed_extension(&ext) {
            return self.skip(&upload.file_name, "extension not allowed");
        }

        let id = ItemId::generate().into_inner();
        let file = format!("{id}.{ext}");
        let target = self.layout.file_path(&file);
        let stored_bytes = match store_payload(upload.payload, &target) {
            Ok(n) => n,
            Err(e) => {
                error!(file_name = %upload.file_name, "moving upload into storage failed: {e}");
                return self.skip(&upload.file_name, "move failed");
            }
        };
        self.instrumentation.observe_stored_file(stored_bytes);

        let stem = stem_of(&original);
        let item = StoredItem {
            id: id.clone(),
            file,
            alt: non_empty(fields.alt.as_deref()).map_or_else(|| default_alt(stem), str::to_string),
            caption_text: non_empty(fields.caption_text.as_deref())
                .map_or_else(|| default_caption(stem), str::to_string),
            tag: Some(Tag::or_default(fields.tag.as_deref())),
            created_at: Some(now_millis()),
            extra: BTreeMap::new(),
        };
        let public = item.to_public(&id, 0);
        debug!(id = %id, file = %item.file, "upload accepted");
        doc.insert(id, item);
        Some((public, target))
    }

    fn fallback_created_at(&self, item: &StoredItem) -> i64 {
        if item.file.is_empty() {
            return 0;
        }
        Self::modified_millis(&self.layout.file_path(&item.file)).unwrap_or(0)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn store_payload(payload: UploadPayload, target: &Path) -> io::Result<u64> {
    match payload {
        UploadPayload::Bytes(bytes) => {
            let part = target.with_extension("part");
            fs::write(&part, &bytes)?;
            if let Err(e) = fs::rename(&part, target) {
                let _ = fs::remove_file(&part);
                return Err(e);
            }
            Ok(bytes.len() as u64)
        }
        UploadPayload::Path(source) => {
            if fs::rename(&source, target).is_ok() {
                return Ok(fs::metadata(target).map(|m| m.len()).unwrap_or(0));
            }
            match fs::copy(&source, target) {
                Ok(n) => {
                    let _ = fs::remove_file(&source);
                    Ok(n)
                }
                Err(e) => {
                    let _ = fs::remove_file(target);
                    Err(e)
                }
            }
        }
        UploadPayload::Failed(reason) => Err(io::Error::other(reason)),
    }
}

fn require_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() {
        return Err(StoreError::new(StoreErrorCode::MissingField, "Missing id"));
    }
    Ok(())
}

impl GalleryStore for LocalFsStore {
    fn list(&self) -> Result<Vec<PublicItem>, StoreError> {
        let doc = self.read_document();
        let mut items: Vec<PublicItem> = doc
            .iter()
            .filter(|(_, item)| !item.file.is_empty())
            .filter_map(|(id, item)| {
                let path = self.layout.file_path(&item.file);
                if !path.is_file() {
                    return None;
                }
                let fallback = Self::modified_millis(&path).unwrap_or(0);
                Some(item.to_public(id, fallback))
            })
            .collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(items)
    }

    fn upload(
        &self,
        files: Vec<PendingUpload>,
        fields: &UploadFields,
    ) -> Result<Vec<PublicItem>, StoreError> {
        if files.is_empty() {
            return Err(self.fail(StoreError::new(StoreErrorCode::UploadRejected, "No files")));
        }
        let mut doc = self.read_document();
        let mut created = Vec::new();
        let mut stored_paths = Vec::new();
        for upload in files {
            if let Some((item, path)) = self.accept_upload(upload, fields, &mut doc) {
                created.push(item);
                stored_paths.push(path);
            }
        }
        if created.is_empty() {
            return Ok(created);
        }
        if let Err(e) = self.write_document(&doc) {
            for path in stored_paths {
                let _ = fs::remove_file(path);
            }
            return Err(e);
        }
        Ok(created)
    }

    fn update(&self, id: &str, patch: &ItemPatch) -> Result<PublicItem, StoreError> {
        require_id(id).map_err(|e| self.fail(e))?;
        let mut doc = self.read_document();
        let Some(item) = doc.get_mut(id) else {
            return Err(self.fail(StoreError::not_found(id)));
        };
        item.apply_patch(patch);
        let item = item.clone();
        self.write_document(&doc)?;
        debug!(id, "item updated");
        Ok(item.to_public(id, self.fallback_created_at(&item)))
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        require_id(id).map_err(|e| self.fail(e))?;
        let mut doc = self.read_document();
        let Some(item) = doc.remove(id) else {
            return Err(self.fail(StoreError::not_found(id)));
        };
        if !item.file.is_empty() {
            let path = self.layout.file_path(&item.file);
            if path.exists() {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(id, "backing file could not be removed: {e}");
                }
            }
        }
        self.write_document(&doc)?;
        debug!(id, "item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_layout_and_empty_document() {
        let root = tempdir().expect("tempdir");
        let store = LocalFsStore::open_data_root(root.path()).expect("open");
        let raw = fs::read_to_string(store.layout().meta_path()).expect("meta");
        assert_eq!(raw.trim(), "{}");
    }

    #[test]
    fn failed_payloads_are_skipped_without_error() {
        let root = tempdir().expect("tempdir");
        let collector = Arc::new(StoreMetricsCollector::default());
        let store = LocalFsStore::open_data_root(root.path())
            .expect("open")
            .with_instrumentation(collector.clone());
        let created = store
            .upload(
                vec![PendingUpload {
                    file_name: "a.png".to_string(),
                    payload: UploadPayload::Failed("partial upload".to_string()),
                }],
                &UploadFields::default(),
            )
            .expect("upload");
        assert!(created.is_empty());
        assert_eq!(collector.snapshot().uploads_skipped, 1);
    }

    #[test]
    fn path_payload_is_moved_into_storage() {
        let root = tempdir().expect("tempdir");
        let scratch = tempdir().expect("scratch");
        let source = scratch.path().join("beach.jpg");
        fs::write(&source, b"jpeg").expect("seed");
        let store = LocalFsStore::open_data_root(root.path()).expect("open");
        let created = store
            .upload(
                vec![PendingUpload::from_path("beach.jpg", source.clone())],
                &UploadFields::default(),
            )
            .expect("upload");
        assert_eq!(created.len(), 1);
        assert!(!source.exists(), "source must be moved");
        let file = created[0].src.trim_start_matches("images/uploads/");
        assert!(store.layout().file_path(file).is_file());
    }

    #[test]
    fn empty_id_is_a_missing_field() {
        let root = tempdir().expect("tempdir");
        let store = LocalFsStore::open_data_root(root.path()).expect("open");
        let err = store.delete("").expect_err("missing id");
        assert_eq!(err.code, StoreErrorCode::MissingField);
        let err = store
            .update("", &ItemPatch::default())
            .expect_err("missing id");
        assert_eq!(err.code, StoreErrorCode::MissingField);
    }
}
