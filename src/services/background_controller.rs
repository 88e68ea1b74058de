//! Decides, for each refresh request, whether to reuse the cache or fetch a
//! new photo, and drives the presenter and cache accordingly.
//!
//! Every failure ends at this boundary: a refresh is logged and returns an
//! outcome, and in the worst case the previous background stays on screen.

use crate::attribution::{self, CurrentPhoto};
use crate::background_cache::{BackgroundCache, CacheLoad};
use crate::config::keys;
use crate::error::{AppError, Result};
use crate::image_fetcher::{FetchedPhoto, ImageFetcher, PhotoMetadata, PhotoSource};
use crate::services::background_presenter::BackgroundPresenter;
use crate::settings;
use crate::storage::{KeyValueStore, load_typed, save_typed};
use log::{debug, error, info, warn};
use std::cell::Cell;
use std::rc::Rc;

/// Where the attribution line is shown.
pub trait PhotoInfoDisplay {
    /// `None` hides the attribution.
    fn show_photo_info(&self, text: Option<&str>);
}

/// Refresh cycle progress, for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Resolving,
    CacheHitGood,
    CacheHitBad,
    CacheMiss,
    Presenting,
}

/// How a refresh cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A high-quality cached image was shown without network access.
    FromCache,
    /// A new photo was fetched from `source`, shown and cached.
    Fetched(PhotoSource),
    /// The cache is valid but unusable right now; the display was left alone.
    KeptCurrent,
    /// Something failed; the display was left alone.
    Failed,
}

pub struct BackgroundController {
    store: Rc<dyn KeyValueStore>,
    cache: Rc<BackgroundCache>,
    fetcher: Rc<ImageFetcher>,
    presenter: BackgroundPresenter,
    photo_info: Rc<dyn PhotoInfoDisplay>,
    phase: Cell<Phase>,
}

impl BackgroundController {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        cache: Rc<BackgroundCache>,
        fetcher: Rc<ImageFetcher>,
        presenter: BackgroundPresenter,
        photo_info: Rc<dyn PhotoInfoDisplay>,
    ) -> Self {
        Self {
            store,
            cache,
            fetcher,
            presenter,
            photo_info,
            phase: Cell::new(Phase::Idle),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    fn enter(&self, phase: Phase) {
        debug!("Background refresh: {:?} -> {:?}", self.phase.get(), phase);
        self.phase.set(phase);
    }

    /// Runs one refresh cycle. Never fails; errors are logged.
    pub async fn refresh(&self) -> RefreshOutcome {
        let outcome = match self.try_refresh().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error loading background: {}", e);
                RefreshOutcome::Failed
            }
        };
        self.enter(Phase::Idle);
        info!("Background refresh finished: {:?}", outcome);
        outcome
    }

    /// Manual refresh: drops the cached entry first so a concurrently firing
    /// expiration timer sees no cache instead of racing this cycle's save.
    pub async fn force_refresh(&self) -> RefreshOutcome {
        if let Err(e) = self.cache.clear().await {
            warn!("Failed to clear cached background: {}", e);
        }
        self.refresh().await
    }

    async fn try_refresh(&self) -> Result<RefreshOutcome> {
        self.enter(Phase::Resolving);

        match self.cache.load().await {
            CacheLoad::ValidUnusable => {
                info!("Keeping current background until the cache expires");
                return Ok(RefreshOutcome::KeptCurrent);
            }
            CacheLoad::ValidUsable(cached) if cached.high_quality => {
                self.enter(Phase::CacheHitGood);
                self.enter(Phase::Presenting);
                match self.presenter.present(cached.bytes).await {
                    Ok(_) => {
                        let entry = cached.entry;
                        self.publish_photo(entry.photo_metadata, entry.source, entry.photo_id)
                            .await;
                        return Ok(RefreshOutcome::FromCache);
                    }
                    // Headers looked fine but the body does not decode
                    Err(AppError::Decode(e)) => {
                        warn!(
                            "Cached background {} does not decode, fetching a new one: {}",
                            cached.entry.photo_id, e
                        );
                        if let Err(e) = self.cache.clear().await {
                            warn!("Failed to remove cached background: {}", e);
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
            CacheLoad::ValidUsable(_) => {
                self.enter(Phase::CacheHitBad);
                info!("Cached background is low quality, fetching a new one");
            }
            CacheLoad::Expired | CacheLoad::NoCache => {}
        }

        self.enter(Phase::CacheMiss);
        let photo = self.fetch_photo().await?;

        self.enter(Phase::Presenting);
        self.presenter.present(photo.bytes.clone()).await?;

        if let Err(e) = self.cache.save(&photo).await {
            warn!("Failed to cache background {}: {}", photo.photo_id, e);
        }

        let FetchedPhoto {
            metadata,
            photo_id,
            source,
            ..
        } = photo;
        self.publish_photo(metadata, source, photo_id).await;
        Ok(RefreshOutcome::Fetched(source))
    }

    async fn fetch_photo(&self) -> Result<FetchedPhoto> {
        match self.fetcher.fetch_random_photo().await {
            Ok(photo) => Ok(photo),
            Err(e) => {
                warn!("Primary photo source failed, using fallback: {}", e);
                self.fetcher.fetch_fallback_photo().await
            }
        }
    }

    /// Mirrors the displayed photo to storage and updates the attribution.
    async fn publish_photo(&self, metadata: PhotoMetadata, source: PhotoSource, photo_id: String) {
        let photo = CurrentPhoto {
            metadata,
            source,
            photo_id,
        };
        if let Err(e) = save_typed(self.store.as_ref(), keys::CURRENT_PHOTO, &photo).await {
            warn!("Failed to store current photo info: {}", e);
        }
        self.render_photo_info(Some(&photo)).await;
    }

    async fn render_photo_info(&self, photo: Option<&CurrentPhoto>) {
        let language = settings::language(self.store.as_ref()).await;
        let text = photo.and_then(|photo| attribution::attribution_text(photo, &language));
        self.photo_info.show_photo_info(text.as_deref());
    }

    /// Re-renders the attribution of the displayed photo, e.g. after a
    /// language change.
    pub async fn update_photo_info(&self) {
        let photo: Option<CurrentPhoto> = load_typed(self.store.as_ref(), keys::CURRENT_PHOTO).await;
        self.render_photo_info(photo.as_ref()).await;
    }

    /// Stores a new UI language and re-renders the attribution in it.
    pub async fn set_language(&self, code: &str) {
        if let Err(e) = settings::set_language(self.store.as_ref(), code).await {
            warn!("Failed to store language {}: {}", code, e);
        }
        self.update_photo_info().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background_cache::CacheEntry;
    use crate::image_loader::{self, ImageBytes};
    use crate::services::background_presenter::{BackgroundSurface, Presentation};
    use crate::storage::MemoryStore;
    use crate::test_support::{
        ManualClock, RecordingSurface, ScriptedHttp, SurfaceCall, noisy_png, small_png,
    };
    use async_std::task::block_on;
    use serde_json::json;
    use std::time::Duration;

    const HOUR: i64 = 3_600_000;
    const START: i64 = 1_700_000_000_000;
    const PRIMARY: &str = "https://raw.githubusercontent.com/bitawareunleashed/photo-storage/main/";

    struct Fixture {
        store: Rc<MemoryStore>,
        http: Rc<ScriptedHttp>,
        clock: Rc<ManualClock>,
        surface: Rc<RecordingSurface>,
        cache: Rc<BackgroundCache>,
        controller: BackgroundController,
    }

    fn fixture(surface: RecordingSurface) -> Fixture {
        let store = Rc::new(MemoryStore::new());
        let http = Rc::new(ScriptedHttp::new());
        let clock = Rc::new(ManualClock::new(START));
        let surface = Rc::new(surface);
        let fetcher = Rc::new(ImageFetcher::new(http.clone()));
        let cache = Rc::new(BackgroundCache::new(
            store.clone(),
            fetcher.clone(),
            clock.clone(),
        ));
        let presenter = BackgroundPresenter::new(surface.clone(), Duration::ZERO);
        let controller = BackgroundController::new(
            store.clone(),
            cache.clone(),
            fetcher,
            presenter,
            surface.clone(),
        );
        Fixture {
            store,
            http,
            clock,
            surface,
            cache,
            controller,
        }
    }

    /// Serves every primary pool photo with metadata.
    fn serve_primary_pool(http: &ScriptedHttp, image: &[u8]) {
        for number in 1..=21 {
            let id = format!("DBE_{:03}", number);
            http.respond(&format!("{PRIMARY}{id}.JPG"), 200, image.to_vec());
            http.respond(
                &format!("{PRIMARY}{id}.json"),
                200,
                json!({"Name": format!("Photo {number}")}).to_string().into_bytes(),
            );
        }
    }

    /// Serves every fallback id with an image and metadata.
    fn serve_fallback(http: &ScriptedHttp, image: &[u8]) {
        for id in 1..=1000 {
            http.respond(
                &format!("https://picsum.photos/1536/864?random={id}"),
                200,
                image.to_vec(),
            );
            http.respond(
                &format!("https://picsum.photos/id/{id}/info"),
                200,
                json!({"author": "Picsum Author", "id": id.to_string()})
                    .to_string()
                    .into_bytes(),
            );
        }
    }

    async fn store_entry(store: &MemoryStore, entry: &CacheEntry) {
        save_typed(store, keys::CACHED_BACKGROUND, entry).await.unwrap();
    }

    fn entry(image: Option<&[u8]>, timestamp: i64) -> CacheEntry {
        let mut metadata = PhotoMetadata::new();
        metadata.insert("Name".into(), json!("Cached"));
        CacheEntry {
            photo_metadata: metadata,
            photo_id: "DBE_099".into(),
            source: PhotoSource::Primary,
            timestamp,
            image_encoding: image.map(|bytes| image_loader::to_data_uri(bytes).unwrap()),
        }
    }

    #[test]
    fn first_paint_fetches_and_applies_directly() {
        let f = fixture(RecordingSurface::new());
        serve_primary_pool(&f.http, &small_png());

        let outcome = block_on(f.controller.refresh());

        assert_eq!(outcome, RefreshOutcome::Fetched(PhotoSource::Primary));
        assert_eq!(f.surface.presentations(), vec![Presentation::Direct]);
        assert_eq!(f.controller.phase(), Phase::Idle);
        block_on(async {
            let saved = f.cache.entry().await.unwrap();
            assert_eq!(saved.timestamp, START);
            assert!(saved.image_encoding.is_some());
        });
        let text = f.surface.photo_info().unwrap();
        assert!(text.starts_with("Foto di Photo "), "{}", text);
    }

    #[test]
    fn expired_cache_is_evicted_and_replaced_with_one_presentation() {
        let f = fixture(RecordingSurface::with_background());
        serve_primary_pool(&f.http, &small_png());

        block_on(async {
            store_entry(&f.store, &entry(Some(&noisy_png(300, 300)), START)).await;
            f.clock.advance(25 * HOUR);

            let outcome = f.controller.refresh().await;
            assert_eq!(outcome, RefreshOutcome::Fetched(PhotoSource::Primary));

            let saved = f.cache.entry().await.unwrap();
            assert_ne!(saved.photo_id, "DBE_099");
            assert_eq!(saved.timestamp, START + 25 * HOUR);
        });
        assert_eq!(f.surface.presentations(), vec![Presentation::Faded]);
    }

    #[test]
    fn fresh_large_cache_is_reused_without_network() {
        let f = fixture(RecordingSurface::with_background());

        block_on(async {
            store_entry(&f.store, &entry(Some(&noisy_png(300, 300)), START)).await;
            f.clock.advance(HOUR / 60 * 10);

            let outcome = f.controller.refresh().await;
            assert_eq!(outcome, RefreshOutcome::FromCache);
        });
        assert!(f.http.requests().is_empty());
        assert_eq!(f.surface.presentations(), vec![Presentation::Faded]);
        assert_eq!(
            f.surface.photo_info().as_deref(),
            Some("Foto di Cached • Codicepunto.it")
        );
    }

    #[test]
    fn hour_old_cache_is_not_high_quality_and_is_replaced() {
        let f = fixture(RecordingSurface::with_background());
        serve_primary_pool(&f.http, &small_png());

        block_on(async {
            store_entry(&f.store, &entry(Some(&noisy_png(300, 300)), START)).await;
            f.clock.advance(HOUR);
            let outcome = f.controller.refresh().await;
            assert_eq!(outcome, RefreshOutcome::Fetched(PhotoSource::Primary));
        });
        assert_eq!(f.surface.presentations(), vec![Presentation::Faded]);
    }

    #[test]
    fn truncated_cached_image_is_dropped_and_replaced() {
        let f = fixture(RecordingSurface::new());
        serve_primary_pool(&f.http, &small_png());

        let png = noisy_png(400, 400);
        let truncated = &png[..png.len() * 4 / 5];
        assert!(image_loader::probe(truncated).is_ok());

        block_on(async {
            store_entry(&f.store, &entry(Some(truncated), START)).await;

            let outcome = f.controller.refresh().await;
            assert_eq!(outcome, RefreshOutcome::Fetched(PhotoSource::Primary));

            let saved = f.cache.entry().await.unwrap();
            assert_ne!(saved.photo_id, "DBE_099");
        });
        assert!(f.surface.has_background());
        assert_eq!(f.surface.presentations(), vec![Presentation::Direct]);
        assert!(!f.http.requests().is_empty());
    }

    #[test]
    fn truncated_cached_image_keeps_current_background_during_fade() {
        let f = fixture(RecordingSurface::with_background());
        serve_primary_pool(&f.http, &small_png());

        let png = noisy_png(400, 400);
        let truncated = &png[..png.len() * 4 / 5];

        block_on(async {
            store_entry(&f.store, &entry(Some(truncated), START)).await;
            let outcome = f.controller.refresh().await;
            assert_eq!(outcome, RefreshOutcome::Fetched(PhotoSource::Primary));
        });
        // only the fresh photo was faded in
        assert_eq!(f.surface.presentations(), vec![Presentation::Faded]);
    }

    #[test]
    fn small_cached_image_is_replaced() {
        let f = fixture(RecordingSurface::with_background());
        serve_primary_pool(&f.http, &small_png());

        block_on(async {
            store_entry(&f.store, &entry(Some(&small_png()), START)).await;
            let outcome = f.controller.refresh().await;
            assert_eq!(outcome, RefreshOutcome::Fetched(PhotoSource::Primary));
        });
        assert_eq!(f.surface.presentations().len(), 1);
    }

    #[test]
    fn unusable_cache_keeps_display_and_entry() {
        let f = fixture(RecordingSurface::with_background());

        block_on(async {
            store_entry(&f.store, &entry(None, START)).await;
            f.clock.advance(HOUR);

            let outcome = f.controller.refresh().await;
            assert_eq!(outcome, RefreshOutcome::KeptCurrent);
            assert!(f.cache.entry().await.is_some());
        });
        assert!(f.surface.calls().is_empty());
        assert_eq!(
            f.http.requests(),
            vec![
                format!("{PRIMARY}DBE_099.JPG"),
                format!("{PRIMARY}DBE_099.jpg"),
            ]
        );
    }

    #[test]
    fn primary_failure_falls_back() {
        let f = fixture(RecordingSurface::new());
        serve_fallback(&f.http, &small_png());

        let outcome = block_on(f.controller.refresh());

        assert_eq!(outcome, RefreshOutcome::Fetched(PhotoSource::Fallback));
        assert_eq!(f.surface.presentations(), vec![Presentation::Direct]);
        let text = f.surface.photo_info().unwrap();
        assert!(
            text.starts_with("Foto di Picsum Author • Picsum Photos ID: "),
            "{}",
            text
        );
        block_on(async {
            assert_eq!(
                f.cache.entry().await.unwrap().source,
                PhotoSource::Fallback
            );
        });
    }

    #[test]
    fn total_failure_is_contained() {
        let f = fixture(RecordingSurface::with_background());

        let outcome = block_on(f.controller.refresh());

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert_eq!(f.controller.phase(), Phase::Idle);
        assert!(f.surface.calls().is_empty());
        block_on(async { assert!(f.cache.entry().await.is_none()) });
    }

    #[test]
    fn undecodable_download_is_not_cached() {
        let f = fixture(RecordingSurface::new());
        serve_primary_pool(&f.http, b"\x89PNG\r\n\x1a\n truncated");

        let outcome = block_on(f.controller.refresh());

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert!(!f.surface.has_background());
        block_on(async { assert!(f.cache.entry().await.is_none()) });
    }

    #[test]
    fn force_refresh_skips_a_good_cache() {
        let f = fixture(RecordingSurface::with_background());
        serve_primary_pool(&f.http, &small_png());

        block_on(async {
            store_entry(&f.store, &entry(Some(&noisy_png(300, 300)), START)).await;
            let outcome = f.controller.force_refresh().await;
            assert_eq!(outcome, RefreshOutcome::Fetched(PhotoSource::Primary));
            assert_ne!(f.cache.entry().await.unwrap().photo_id, "DBE_099");
        });
        assert!(!f.http.requests().is_empty());
    }

    #[test]
    fn language_change_rerenders_attribution() {
        let f = fixture(RecordingSurface::new());
        serve_primary_pool(&f.http, &small_png());

        block_on(async {
            f.controller.refresh().await;
            f.controller.set_language("en").await;
        });
        let text = f.surface.photo_info().unwrap();
        assert!(text.starts_with("Photo by Photo "), "{}", text);
        assert!(matches!(
            f.surface.calls().last(),
            Some(SurfaceCall::PhotoInfo(Some(_)))
        ));
    }

    #[test]
    fn update_photo_info_without_photo_hides_attribution() {
        let f = fixture(RecordingSurface::new());
        block_on(f.controller.update_photo_info());
        assert_eq!(f.surface.calls(), vec![SurfaceCall::PhotoInfo(None)]);
    }

    #[test]
    fn cached_image_bytes_match_saved_photo() {
        let f = fixture(RecordingSurface::with_background());
        let png = noisy_png(300, 300);
        block_on(async {
            f.cache
                .save(&FetchedPhoto {
                    bytes: ImageBytes::from(png.clone()),
                    metadata: PhotoMetadata::new(),
                    photo_id: "DBE_011".into(),
                    source: PhotoSource::Primary,
                })
                .await
                .unwrap();
            assert_eq!(f.controller.refresh().await, RefreshOutcome::FromCache);
        });
        assert_eq!(f.surface.last_painted(), Some((300, 300)));
    }
}
