// SPDX-License-Identifier: Apache-2.0

use crate::item::{ItemPatch, PublicItem, Tag};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One record of the metadata document, keyed by item id.
///
/// Every field is optional on read and odd scalar types are coerced, so hand-edited
/// or older documents still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredItem {
    #[serde(default, deserialize_with = "crate::serde_helpers::lenient_text::deserialize")]
    pub id: String,
    #[serde(default, deserialize_with = "crate::serde_helpers::lenient_text::deserialize")]
    pub file: String,
    #[serde(default, deserialize_with = "crate::serde_helpers::lenient_text::deserialize")]
    pub alt: String,
    #[serde(default, deserialize_with = "crate::serde_helpers::lenient_text::deserialize")]
    pub caption_text: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::serde_helpers::lenient_tag::deserialize"
    )]
    pub tag: Option<Tag>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_helpers::lenient_millis"
    )]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StoredItem {
    #[must_use]
    pub fn tag_or_default(&self) -> Tag {
        self.tag.clone().unwrap_or_default()
    }

    pub fn apply_patch(&mut self, patch: &ItemPatch) {
        if let Some(caption) = &patch.caption_text {
            self.caption_text.clone_from(caption);
        }
        if let Some(tag) = &patch.tag {
            self.tag = Some(Tag::new(tag.clone()));
        }
        if let Some(alt) = &patch.alt {
            self.alt.clone_from(alt);
        }
    }

    /// Public view. `fallback_created_at` covers records written without a timestamp.
    #[must_use]
    pub fn to_public(&self, id: &str, fallback_created_at: i64) -> PublicItem {
        PublicItem {
            id: id.to_string(),
            src: PublicItem::public_src(&self.file),
            alt: self.alt.clone(),
            caption_text: self.caption_text.clone(),
            tag: self.tag_or_default(),
            created_at: self.created_at.unwrap_or(fallback_created_at),
        }
    }
}

/// The whole `meta.json` table: id to record.
///
/// Entries that are not records stay in `opaque` untouched and are written back
/// as they were read. They are invisible to lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataDocument {
    entries: BTreeMap<String, StoredItem>,
    opaque: BTreeMap<String, Value>,
}

impl MetadataDocument {
    /// Tolerant parse: empty, malformed or non-object input reads as an empty table.
    #[must_use]
    pub fn from_json_bytes(raw: &[u8]) -> Self {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(raw) else {
            return Self::default();
        };
        Self::from_object(map)
    }

    fn from_object(map: Map<String, Value>) -> Self {
        let mut doc = Self::default();
        for (id, value) in map {
            if !value.is_object() {
                doc.opaque.insert(id, value);
                continue;
            }
            match serde_json::from_value::<StoredItem>(value.clone()) {
                Ok(item) => {
                    doc.entries.insert(id, item);
                }
                Err(_) => {
                    doc.opaque.insert(id, value);
                }
            }
        }
        doc
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Map::new();
        for (id, value) in &self.opaque {
            out.insert(id.clone(), value.clone());
        }
        for (id, item) in &self.entries {
            out.insert(id.clone(), serde_json::to_value(item)?);
        }
        serde_json::to_vec_pretty(&Value::Object(out))
    }

    /// Entries kept verbatim because they are not readable records.
    #[must_use]
    pub fn opaque_len(&self) -> usize {
        self.opaque.len()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StoredItem> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut StoredItem> {
        self.entries.get_mut(id)
    }

    pub fn insert(&mut self, id: String, item: StoredItem) -> Option<StoredItem> {
        self.opaque.remove(&id);
        self.entries.insert(id, item)
    }

    pub fn remove(&mut self, id: &str) -> Option<StoredItem> {
        self.entries.remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StoredItem)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
