// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Keepsake gallery client.
//!
//! [`GallerySession`] owns the card list shown to a user and reconciles it
//! with a [`GalleryApi`] backend: a keepsake server over HTTP, or a local
//! key/value store for the offline variant. Preferences (theme, filter
//! labels, hidden built-in cards) live in [`prefs`].

pub mod api;
pub mod category;
mod error;
pub mod gallery;
pub mod grid;
pub mod lightbox;
pub mod prefs;

pub use api::{GalleryApi, HttpGalleryApi, LocalGalleryApi, UploadFile, UploadOptions};
pub use error::{ClientError, ClientErrorCode};
pub use gallery::{Card, GallerySession};
pub use grid::GridLayout;
pub use lightbox::{Key, KeyOutcome, Lightbox, LightboxControl, LightboxItem, LightboxState};
pub use prefs::{
    FileKvStore, FilterLabels, HiddenDefaults, KvStore, MemoryKvStore, ThemeMode, ThemePreference,
};

pub const CRATE_NAME: &str = "keepsake-client";
