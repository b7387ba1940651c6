// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Where the bytes of one uploaded file currently are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPayload {
    Bytes(Vec<u8>),
    /// A file on the same machine; moved into storage, copied when rename crosses filesystems.
    Path(PathBuf),
    /// The transport reported an error for this file; it is skipped.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file_name: String,
    pub payload: UploadPayload,
}

impl PendingUpload {
    #[must_use]
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            payload: UploadPayload::Bytes(bytes),
        }
    }

    #[must_use]
    pub fn from_path(file_name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            file_name: file_name.into(),
            payload: UploadPayload::Path(path),
        }
    }
}

/// Metadata shared by every file of one upload batch. Empty values take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadFields {
    pub tag: Option<String>,
    pub caption_text: Option<String>,
    pub alt: Option<String>,
}
