//! Event handlers for UI callbacks.
//!
//! Every callback spawns its work on the Slint event loop. `Compat` gives the
//! spawned futures the tokio context the HTTP client needs.

use crate::attribution::LANGUAGES;
use crate::config::CACHE_DURATION_CHOICES;
use crate::state::AppState;
use async_compat::Compat;
use log::{error, warn};
use slint::ComponentHandle;
use std::future::Future;
use std::rc::Rc;

/// Spawns `future` on the event loop, logging if the loop is gone.
pub fn spawn_ui_task(future: impl Future<Output = ()> + 'static) {
    if let Err(e) = slint::spawn_local(Compat::new(future)) {
        error!("Failed to spawn UI task: {}", e);
    }
}

/// Sets up all UI event handlers for the application.
pub fn setup_handlers(ui: &crate::AppWindow, state: Rc<AppState>) {
    // Manual refresh: disables the button while the cycle runs
    ui.global::<crate::Logic>().on_refresh_background({
        let ui_handle = ui.as_weak();
        let state = state.clone();
        move || {
            let ui_handle = ui_handle.clone();
            let state = state.clone();
            spawn_ui_task(async move {
                if let Some(ui) = ui_handle.upgrade() {
                    ui.global::<crate::BackdropState>().set_refreshing(true);
                }
                let outcome = state.manual_refresh().await;
                log::info!("Manual refresh: {:?}", outcome);
                if let Some(ui) = ui_handle.upgrade() {
                    ui.global::<crate::BackdropState>().set_refreshing(false);
                }
            });
        }
    });

    ui.global::<crate::Logic>().on_select_language({
        let state = state.clone();
        move |index| {
            let Some(code) = usize::try_from(index).ok().and_then(|i| LANGUAGES.get(i).copied()) else {
                warn!("Ignoring unknown language index {}", index);
                return;
            };
            let state = state.clone();
            spawn_ui_task(async move {
                state.change_language(code).await;
            });
        }
    });

    ui.global::<crate::Logic>().on_select_cache_duration({
        let state = state.clone();
        move |index| {
            let Some(hours) = usize::try_from(index)
                .ok()
                .and_then(|i| CACHE_DURATION_CHOICES.get(i).copied())
            else {
                warn!("Ignoring unknown cache duration index {}", index);
                return;
            };
            let state = state.clone();
            spawn_ui_task(async move {
                state.change_cache_duration(hours).await;
            });
        }
    });
}
