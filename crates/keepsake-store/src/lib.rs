// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Metadata store over a single uploads directory.
//!
//! All state lives in `meta.json` next to the image files. Each mutation reads
//! the whole document, edits it in memory, writes `meta.json.tmp` and renames it
//! over the original. There is no cross-process locking: the last rename wins.

mod backend;
mod error;
mod paths;
mod upload;

pub use backend::{
    GalleryStore, LocalFsStore, NoopInstrumentation, StoreInstrumentation, StoreMetrics,
    StoreMetricsCollector,
};
pub use error::{StoreError, StoreErrorCode};
pub use paths::{StoreLayout, META_FILE, META_TMP_FILE, UPLOADS_SUBDIR};
pub use upload::{PendingUpload, UploadFields, UploadPayload};

pub const CRATE_NAME: &str = "keepsake-store";
