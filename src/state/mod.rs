//! Application-wide components, created once at startup.

use crate::background_cache::BackgroundCache;
use crate::clock::SystemClock;
use crate::config::FADE_DURATION;
use crate::error::Result;
use crate::http_client::ReqwestClient;
use crate::image_fetcher::ImageFetcher;
use crate::services::{
    BackgroundController, BackgroundPresenter, ExpirationScheduler, RefreshOutcome, TimerTask,
};
use crate::settings;
use crate::storage::{self, KeyValueStore};
use crate::ui::{SlintSurface, SlintTimerSlot};
use log::{debug, info, warn};
use slint::ComponentHandle;
use std::rc::Rc;

pub struct AppState {
    pub store: Rc<dyn KeyValueStore>,
    pub controller: Rc<BackgroundController>,
    pub scheduler: Rc<ExpirationScheduler>,
}

impl AppState {
    pub fn new(ui: &crate::AppWindow) -> Result<Rc<Self>> {
        let store = storage::open_default_store();
        let fetcher = Rc::new(ImageFetcher::new(Rc::new(ReqwestClient::new()?)));
        let cache = Rc::new(BackgroundCache::new(
            store.clone(),
            fetcher.clone(),
            Rc::new(SystemClock),
        ));

        let surface = Rc::new(SlintSurface::new(ui.as_weak()));
        let controller = Rc::new(BackgroundController::new(
            store.clone(),
            cache.clone(),
            fetcher,
            BackgroundPresenter::new(surface.clone(), FADE_DURATION),
            surface,
        ));

        let scheduler = {
            let controller = controller.clone();
            ExpirationScheduler::new(cache, Rc::new(SlintTimerSlot::new()), move || -> TimerTask {
                let controller = controller.clone();
                Box::pin(async move {
                    controller.refresh().await;
                })
            })
        };

        Ok(Rc::new(Self {
            store,
            controller,
            scheduler,
        }))
    }

    /// First paint of the session, then arms the expiration timer.
    pub async fn start(&self) {
        self.controller.refresh().await;
        self.scheduler.rearm().await;
    }

    pub async fn manual_refresh(&self) -> RefreshOutcome {
        debug!("Manual refresh requested ({:?})", self.controller.phase());
        let outcome = self.controller.force_refresh().await;
        self.scheduler.rearm().await;
        outcome
    }

    /// Stores the new cache duration and re-arms the timer against it.
    pub async fn change_cache_duration(&self, hours: f64) {
        if let Err(e) = settings::set_cache_duration(self.store.as_ref(), hours).await {
            warn!("Failed to store cache duration: {}", e);
            return;
        }
        info!("Cache duration set to {} h", hours);
        self.scheduler.rearm().await;
    }

    pub async fn change_language(&self, code: &str) {
        info!("Language set to {}", code);
        self.controller.set_language(code).await;
    }
}
