//! Puts resolved images on screen.
//!
//! The first image of a session is painted directly. Later images crossfade:
//! the new image is painted on an overlay layer that fades in while the
//! primary layer fades out, then the image is committed to the primary layer
//! and the overlay is removed in the same frame, so no blank frame is shown.

use crate::error::Result;
use crate::image_loader::{self, DecodedImage, ImageBytes};
use log::{debug, warn};
use std::rc::Rc;
use std::time::Duration;

/// The visible background. Layer fit (cover, centered, no repeat) is fixed
/// by the implementation.
pub trait BackgroundSurface {
    /// Whether any background has been painted during this session.
    fn has_background(&self) -> bool;
    fn paint_primary(&self, image: &DecodedImage);
    fn set_primary_opacity(&self, opacity: f32);
    /// Shows the overlay layer (behind interactive content) with `image`.
    fn paint_overlay(&self, image: &DecodedImage);
    fn set_overlay_opacity(&self, opacity: f32);
    fn clear_overlay(&self);
    /// Length of opacity transitions. `Duration::ZERO` disables animation.
    fn set_transition(&self, duration: Duration);
}

/// How an image ended up on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Direct,
    Faded,
}

pub struct BackgroundPresenter {
    surface: Rc<dyn BackgroundSurface>,
    fade_duration: Duration,
}

impl BackgroundPresenter {
    pub fn new(surface: Rc<dyn BackgroundSurface>, fade_duration: Duration) -> Self {
        Self {
            surface,
            fade_duration,
        }
    }

    /// Applies `bytes`, directly on first paint and with a crossfade after.
    pub async fn present(&self, bytes: ImageBytes) -> Result<Presentation> {
        if self.surface.has_background() {
            self.apply_with_fade(bytes).await
        } else {
            self.apply_direct(bytes).await
        }
    }

    /// Paints the image at full opacity without animation. Fails, leaving the
    /// surface untouched, when the image does not decode.
    pub async fn apply_direct(&self, bytes: ImageBytes) -> Result<Presentation> {
        let decoded = image_loader::decode(bytes).await?;
        self.surface.set_transition(Duration::ZERO);
        self.surface.paint_primary(&decoded);
        self.surface.set_primary_opacity(1.0);
        debug!("Background applied directly ({}x{})", decoded.width, decoded.height);
        Ok(Presentation::Direct)
    }

    /// Crossfades from the current background to the image.
    ///
    /// The image is decoded before anything is touched, so an undecodable
    /// image fails with the current background still fully visible.
    pub async fn apply_with_fade(&self, bytes: ImageBytes) -> Result<Presentation> {
        let decoded = image_loader::decode(bytes).await.inspect_err(|e| {
            warn!("Preload for crossfade failed, keeping current background: {}", e);
        })?;

        let surface = &self.surface;
        surface.set_transition(Duration::ZERO);
        surface.paint_overlay(&decoded);
        surface.set_overlay_opacity(0.0);

        surface.set_transition(self.fade_duration);
        surface.set_overlay_opacity(1.0);
        surface.set_primary_opacity(0.0);

        async_std::task::sleep(self.fade_duration).await;

        surface.set_transition(Duration::ZERO);
        surface.paint_primary(&decoded);
        surface.set_primary_opacity(1.0);
        surface.clear_overlay();
        debug!("Background crossfade complete ({}x{})", decoded.width, decoded.height);
        Ok(Presentation::Faded)
    }
}
