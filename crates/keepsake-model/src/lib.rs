// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Keepsake model SSOT.
//!
//! Stored records, their public wire view, and the filename policy applied to
//! uploads all live here so the store, server and client agree on one shape.

mod document;
mod filename;
mod item;
mod serde_helpers;

pub use document::{MetadataDocument, StoredItem};
pub use filename::{
    allowed_extension, default_alt, default_caption, extension_of, image_mime_type,
    sanitize_filename, stem_of, ALLOWED_EXTENSIONS, CAPTION_PREFIX,
};
pub use item::{
    now_millis, ItemId, ItemPatch, PublicItem, Tag, ValidationError, ID_PREFIX, PUBLIC_UPLOADS_PREFIX,
};
pub use serde_helpers::lenient_string;

pub const CRATE_NAME: &str = "keepsake-model";
