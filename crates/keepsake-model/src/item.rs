// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const ID_PREFIX: &str = "img_";
pub const PUBLIC_UPLOADS_PREFIX: &str = "images/uploads/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(1);

#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

fn now_micros() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_micros())
}

/// Opaque item key. Only uniqueness is guaranteed, not ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.is_empty() {
            return Err(ValidationError("item id must not be empty".to_string()));
        }
        if input.contains(['/', '\\']) || input.contains("..") {
            return Err(ValidationError(
                "item id must not contain path separators".to_string(),
            ));
        }
        Ok(Self(input.to_string()))
    }

    /// Time-derived id with a process-unique suffix, e.g. `img_5f1c0a2b3d4e5.00000007`.
    #[must_use]
    pub fn generate() -> Self {
        let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{ID_PREFIX}{:x}.{seq:08x}", now_micros()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category label. Free-form on the wire; the gallery ships three known tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub const NATURE: &'static str = "nature";
    pub const CITY: &'static str = "city";
    pub const ABSTRACT: &'static str = "abstract";
    pub const KNOWN: [&'static str; 3] = [Self::NATURE, Self::CITY, Self::ABSTRACT];

    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Empty input falls back to the default tag.
    #[must_use]
    pub fn or_default(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self(v.to_string()),
            _ => Self::default(),
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(&self.0.as_str())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self(Self::NATURE.to_string())
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public view of an item as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicItem {
    pub id: String,
    pub src: String,
    pub alt: String,
    pub caption_text: String,
    pub tag: Tag,
    pub created_at: i64,
}

impl PublicItem {
    #[must_use]
    pub fn public_src(file: &str) -> String {
        format!("{PUBLIC_UPLOADS_PREFIX}{file}")
    }
}

/// Subset of editable fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::lenient_string::deserialize"
    )]
    pub caption_text: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::lenient_string::deserialize"
    )]
    pub tag: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::lenient_string::deserialize"
    )]
    pub alt: Option<String>,
}

impl ItemPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caption_text.is_none() && self.tag.is_none() && self.alt.is_none()
    }

    #[must_use]
    pub fn caption(text: impl Into<String>) -> Self {
        Self {
            caption_text: Some(text.into()),
            ..Self::default()
        }
    }
}
