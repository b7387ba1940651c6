// SPDX-License-Identifier: Apache-2.0

//! Card list of one gallery view and the operations that keep it consistent
//! with the backing store.
//!
//! Built-in cards ship with the client and are never sent to the store;
//! deleting one only records its `src` in [`HiddenDefaults`]. Persisted cards
//! come from [`GalleryApi::list`] and are changed locally only after the
//! store confirms a mutation.

use crate::api::{GalleryApi, UploadFile, UploadOptions};
use crate::error::{ClientError, ClientErrorCode};
use crate::grid::{matches_filter, GridLayout, FILTER_ALL};
use crate::lightbox::{Key, KeyOutcome, Lightbox, LightboxItem};
use crate::prefs::{HiddenDefaults, KvStore};
use keepsake_model::{ItemPatch, PublicItem, Tag};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Store id; `None` for built-in cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub caption_text: String,
    #[serde(default)]
    pub tag: Tag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Card {
    #[must_use]
    pub fn builtin(src: &str, alt: &str, caption_text: &str, tag: Tag) -> Self {
        Self {
            id: None,
            src: src.to_string(),
            alt: alt.to_string(),
            caption_text: caption_text.to_string(),
            tag,
            created_at: None,
        }
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    fn lightbox_item(&self) -> LightboxItem {
        LightboxItem {
            src: self.src.clone(),
            alt: self.alt.clone(),
            caption_text: self.caption_text.trim().to_string(),
        }
    }
}

impl From<PublicItem> for Card {
    fn from(item: PublicItem) -> Self {
        Self {
            id: Some(item.id),
            src: item.src,
            alt: item.alt,
            caption_text: item.caption_text,
            tag: item.tag,
            created_at: Some(item.created_at),
        }
    }
}

pub struct GallerySession {
    api: Arc<dyn GalleryApi>,
    kv: Arc<dyn KvStore>,
    defaults: Vec<Card>,
    cards: Vec<Card>,
    filter: String,
    grid: GridLayout,
    lightbox: Lightbox,
}

impl GallerySession {
    #[must_use]
    pub fn new(api: Arc<dyn GalleryApi>, kv: Arc<dyn KvStore>, defaults: Vec<Card>) -> Self {
        Self {
            api,
            kv,
            defaults,
            cards: Vec::new(),
            filter: FILTER_ALL.to_string(),
            grid: GridLayout::default(),
            lightbox: Lightbox::default(),
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    pub fn set_columns(&mut self, columns: u8) -> Result<(), ClientError> {
        self.grid.set_columns(columns)
    }

    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
    }

    #[must_use]
    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    fn visible_defaults(&self) -> Result<Vec<Card>, ClientError> {
        let hidden = HiddenDefaults::new(self.kv.as_ref()).load()?;
        Ok(self
            .defaults
            .iter()
            .filter(|card| !hidden.contains(&card.src))
            .cloned()
            .collect())
    }

    /// Built-in cards minus hidden ones, with persisted items newest first on top.
    ///
    /// When listing fails the built-in cards are still shown and the error is returned.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let defaults = self.visible_defaults()?;
        match self.api.list().await {
            Ok(items) => {
                self.cards = items.into_iter().map(Card::from).collect();
                self.cards.extend(defaults);
                debug!(cards = self.cards.len(), "gallery loaded");
                Ok(())
            }
            Err(e) => {
                warn!("loading persisted items failed: {e}");
                self.cards = defaults;
                Err(e)
            }
        }
    }

    /// Replaces the persisted cards with the store's current listing.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let items = self.api.list().await.inspect_err(|e| {
            warn!("refreshing persisted items failed: {e}");
        })?;
        let builtins: Vec<Card> = self
            .cards
            .drain(..)
            .filter(|card| !card.is_persisted())
            .collect();
        self.cards = items.into_iter().map(Card::from).collect();
        self.cards.extend(builtins);
        Ok(())
    }

    /// Uploads `files`; each created item lands on top, the last one first.
    pub async fn upload(
        &mut self,
        files: Vec<UploadFile>,
        options: &UploadOptions,
    ) -> Result<Vec<Card>, ClientError> {
        let submitted = files.len();
        let created = self.api.upload(files, options).await.inspect_err(|e| {
            warn!("upload failed: {e}");
        })?;
        let cards: Vec<Card> = created.into_iter().map(Card::from).collect();
        for card in &cards {
            self.cards.insert(0, card.clone());
        }
        info!(submitted, created = cards.len(), "upload finished");
        Ok(cards)
    }

    fn card(&self, index: usize) -> Result<&Card, ClientError> {
        self.cards.get(index).ok_or_else(|| {
            ClientError::new(
                ClientErrorCode::Invalid,
                format!("no card at position {index}"),
            )
        })
    }

    /// Saves a trimmed caption for a persisted card.
    pub async fn edit_caption(&mut self, index: usize, text: &str) -> Result<Card, ClientError> {
        let card = self.card(index)?;
        let Some(id) = card.id.clone() else {
            return Err(ClientError::new(
                ClientErrorCode::Invalid,
                "built-in cards keep their captions",
            ));
        };
        let item = self
            .api
            .update(&id, &ItemPatch::caption(text.trim()))
            .await
            .inspect_err(|e| warn!(id = %id, "caption update failed: {e}"))?;
        let updated = Card::from(item);
        self.cards[index] = updated.clone();
        Ok(updated)
    }

    /// Deletes a persisted card from the store, or hides a built-in one.
    ///
    /// A store that no longer knows the id counts as deleted.
    pub async fn delete(&mut self, index: usize) -> Result<Card, ClientError> {
        let card = self.card(index)?.clone();
        match &card.id {
            Some(id) => match self.api.delete(id).await {
                Ok(()) => {}
                Err(e) if e.code == ClientErrorCode::NotFound => {
                    debug!(id = %id, "item already gone from the store");
                }
                Err(e) => {
                    warn!(id = %id, "delete failed: {e}");
                    return Err(e);
                }
            },
            None => HiddenDefaults::new(self.kv.as_ref()).add(&card.src)?,
        }
        self.cards.remove(index);
        Ok(card)
    }

    /// Cards matching the current filter, with their positions in [`Self::cards`].
    #[must_use]
    pub fn visible_cards(&self) -> Vec<(usize, &Card)> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| matches_filter(&self.filter, card.tag.as_str()))
            .collect()
    }

    /// Opens the viewer on the card at `index` over every card in the gallery.
    pub fn open_lightbox(&mut self, index: usize) -> Result<(), ClientError> {
        let items: Vec<LightboxItem> = self.cards.iter().map(Card::lightbox_item).collect();
        self.lightbox
            .open(index, items, Some(format!("card:{index}")))
    }

    pub fn handle_key(&mut self, key: &Key) -> KeyOutcome {
        self.lightbox.handle_key(key)
    }
}
