//! Background layers and attribution backed by the `BackdropState` global.

use crate::image_loader::{self, DecodedImage};
use crate::services::background_controller::PhotoInfoDisplay;
use crate::services::background_presenter::BackgroundSurface;
use slint::ComponentHandle;
use std::cell::Cell;
use std::time::Duration;

pub struct SlintSurface {
    ui: slint::Weak<crate::AppWindow>,
    has_background: Cell<bool>,
}

impl SlintSurface {
    pub fn new(ui: slint::Weak<crate::AppWindow>) -> Self {
        Self {
            ui,
            has_background: Cell::new(false),
        }
    }

    /// Runs `f` against the window if it is still alive.
    fn with_ui(&self, f: impl FnOnce(&crate::AppWindow)) {
        if let Some(ui) = self.ui.upgrade() {
            f(&ui);
        }
    }
}

impl BackgroundSurface for SlintSurface {
    fn has_background(&self) -> bool {
        self.has_background.get()
    }

    fn paint_primary(&self, image: &DecodedImage) {
        self.with_ui(|ui| {
            ui.global::<crate::BackdropState>()
                .set_primary_image(image_loader::create_slint_image(image));
        });
        self.has_background.set(true);
    }

    fn set_primary_opacity(&self, opacity: f32) {
        self.with_ui(|ui| ui.global::<crate::BackdropState>().set_primary_opacity(opacity));
    }

    fn paint_overlay(&self, image: &DecodedImage) {
        self.with_ui(|ui| {
            ui.global::<crate::BackdropState>()
                .set_overlay_image(image_loader::create_slint_image(image));
        });
    }

    fn set_overlay_opacity(&self, opacity: f32) {
        self.with_ui(|ui| ui.global::<crate::BackdropState>().set_overlay_opacity(opacity));
    }

    fn clear_overlay(&self) {
        self.with_ui(|ui| {
            let state = ui.global::<crate::BackdropState>();
            state.set_overlay_opacity(0.0);
            state.set_overlay_image(slint::Image::default());
        });
    }

    fn set_transition(&self, duration: Duration) {
        let millis = duration.as_millis().min(i64::MAX as u128) as i64;
        self.with_ui(|ui| ui.global::<crate::BackdropState>().set_fade_duration(millis));
    }
}

impl PhotoInfoDisplay for SlintSurface {
    fn show_photo_info(&self, text: Option<&str>) {
        self.with_ui(|ui| crate::ui::set_photo_info(ui, text));
    }
}
