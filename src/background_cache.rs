//! Single-entry cache of the last displayed background.
//!
//! The entry is replaced wholesale on every save and removed when it expires
//! or turns out to be unreadable. A valid entry is additionally graded for
//! quality so the controller can decide whether it is worth reusing.

use crate::clock::Clock;
use crate::config::{MAX_QUALITY_AGE_MINUTES, MIN_QUALITY_BYTES, keys};
use crate::error::Result;
use crate::image_fetcher::{FetchedPhoto, ImageFetcher, PhotoMetadata, PhotoSource};
use crate::image_loader::{self, ImageBytes};
use crate::settings;
use crate::storage::{KeyValueStore, load_typed, save_typed};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// The persisted record describing the last fetched background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub photo_metadata: PhotoMetadata,
    pub photo_id: String,
    pub source: PhotoSource,
    /// Epoch milliseconds of the save.
    pub timestamp: i64,
    /// Base64 data URI of the image, absent for metadata-only entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_encoding: Option<String>,
}

impl CacheEntry {
    /// Age in milliseconds. A timestamp in the future counts as age zero.
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        (now_millis - self.timestamp).max(0)
    }
}

/// Image and entry of a usable cache hit.
#[derive(Clone)]
pub struct CachedImage {
    pub bytes: ImageBytes,
    pub entry: CacheEntry,
    pub high_quality: bool,
}

/// Every outcome of [`BackgroundCache::load`].
pub enum CacheLoad {
    /// Nothing cached (or the entry was unreadable and has been removed).
    NoCache,
    /// The entry outlived the cache duration and has been removed.
    Expired,
    /// The entry is valid but its image could not be downloaded. The current
    /// display should be kept and the entry left to expire naturally.
    ValidUnusable,
    ValidUsable(CachedImage),
}

/// Whether a cached entry is good enough to show without fetching a new one.
///
/// Requires an embedded image of at least [`MIN_QUALITY_BYTES`] (estimated)
/// that is no older than [`MAX_QUALITY_AGE_MINUTES`].
pub fn is_high_quality(entry: &CacheEntry, now_millis: i64) -> bool {
    let Some(encoding) = entry.image_encoding.as_deref() else {
        return false;
    };
    if image_loader::estimated_size(encoding) < MIN_QUALITY_BYTES {
        return false;
    }
    let age_minutes = entry.age_millis(now_millis) as f64 / 60_000.0;
    age_minutes <= MAX_QUALITY_AGE_MINUTES
}

pub struct BackgroundCache {
    store: Rc<dyn KeyValueStore>,
    fetcher: Rc<ImageFetcher>,
    clock: Rc<dyn Clock>,
}

impl BackgroundCache {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        fetcher: Rc<ImageFetcher>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            fetcher,
            clock,
        }
    }

    /// Reads the current entry without judging it.
    pub async fn entry(&self) -> Option<CacheEntry> {
        load_typed(self.store.as_ref(), keys::CACHED_BACKGROUND).await
    }

    /// Persists `photo` as the new entry, replacing any previous one.
    ///
    /// If the image cannot be encoded, a metadata-only entry is written.
    pub async fn save(&self, photo: &FetchedPhoto) -> Result<CacheEntry> {
        let image_encoding = match image_loader::to_data_uri(&photo.bytes) {
            Ok(uri) => Some(uri),
            Err(e) => {
                warn!("Caching {} without image data: {}", photo.photo_id, e);
                None
            }
        };

        let entry = CacheEntry {
            photo_metadata: photo.metadata.clone(),
            photo_id: photo.photo_id.clone(),
            source: photo.source,
            timestamp: self.clock.now_millis(),
            image_encoding,
        };
        save_typed(self.store.as_ref(), keys::CACHED_BACKGROUND, &entry).await?;

        info!(
            "Cache PUT: {} ({:?}, {})",
            entry.photo_id,
            entry.source,
            if entry.image_encoding.is_some() {
                "with image"
            } else {
                "metadata only"
            }
        );
        Ok(entry)
    }

    /// Removes the entry.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(keys::CACHED_BACKGROUND).await
    }

    /// Cache duration in effect, after clamping the user's setting.
    pub async fn effective_duration(&self) -> std::time::Duration {
        settings::effective_duration(settings::cache_duration_hours(self.store.as_ref()).await)
    }

    /// Milliseconds until the entry expires (negative once overdue), or
    /// `None` when nothing is cached.
    pub async fn remaining_millis(&self) -> Option<i64> {
        let entry = self.entry().await?;
        let duration = self.effective_duration().await.as_millis() as i64;
        Some(duration - entry.age_millis(self.clock.now_millis()))
    }

    /// Looks up the entry and resolves it to something displayable.
    pub async fn load(&self) -> CacheLoad {
        let Some(entry) = self.entry().await else {
            info!("Cache MISS: nothing cached");
            return CacheLoad::NoCache;
        };

        let now = self.clock.now_millis();
        let age = entry.age_millis(now);
        let duration = self.effective_duration().await;
        if age >= duration.as_millis() as i64 {
            info!(
                "Cache EXPIRED: {} is {} min old (limit {} min)",
                entry.photo_id,
                age / 60_000,
                duration.as_secs() / 60
            );
            self.remove_logged().await;
            return CacheLoad::Expired;
        }

        let bytes = match entry.image_encoding.as_deref() {
            Some(encoding) => match decode_embedded(encoding) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Cached image for {} is unreadable: {}", entry.photo_id, e);
                    self.remove_logged().await;
                    return CacheLoad::NoCache;
                }
            },
            None => match self.refetch_checked(&entry).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        "Cached photo {} could not be reloaded, keeping current display: {}",
                        entry.photo_id, e
                    );
                    return CacheLoad::ValidUnusable;
                }
            },
        };

        let high_quality = is_high_quality(&entry, now);
        info!(
            "Cache HIT: {} ({} min old, high quality: {})",
            entry.photo_id,
            age / 60_000,
            high_quality
        );
        CacheLoad::ValidUsable(CachedImage {
            bytes,
            entry,
            high_quality,
        })
    }

    async fn refetch_checked(&self, entry: &CacheEntry) -> Result<ImageBytes> {
        let bytes = self.fetcher.refetch(entry.source, &entry.photo_id).await?;
        image_loader::probe(&bytes)?;
        Ok(bytes)
    }

    async fn remove_logged(&self) {
        if let Err(e) = self.clear().await {
            warn!("Failed to remove cached background: {}", e);
        }
    }
}

fn decode_embedded(encoding: &str) -> Result<ImageBytes> {
    let bytes = image_loader::from_data_uri(encoding)?;
    image_loader::probe(&bytes)?;
    Ok(ImageBytes::from(bytes))
}
