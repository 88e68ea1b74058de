//! In-memory fakes for the clock, network, screen and timer.

use crate::clock::Clock;
use crate::error::Result;
use crate::http_client::{HttpClient, HttpResponse};
use crate::image_loader::DecodedImage;
use crate::services::background_controller::PhotoInfoDisplay;
use crate::services::background_presenter::{BackgroundSurface, Presentation};
use crate::services::expiration_scheduler::{TimerSlot, TimerTask};
use async_trait::async_trait;
use image::{ImageBuffer, ImageFormat, Rgb};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Cursor;
use std::time::Duration;

pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: Cell::new(start_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.set(self.now.get() + millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.get()
    }
}

/// Serves canned responses by exact URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct ScriptedHttp {
    responses: RefCell<HashMap<String, (u16, Vec<u8>)>>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: Vec<u8>) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), (status, body));
    }

    /// Every requested URL, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl HttpClient for ScriptedHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(url.to_string());
        let (status, body) = self
            .responses
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or((404, Vec::new()));
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Transition(Duration),
    PaintPrimary(u32, u32),
    PrimaryOpacity(f32),
    PaintOverlay(u32, u32),
    OverlayOpacity(f32),
    ClearOverlay,
    PhotoInfo(Option<String>),
}

/// Records everything painted on it.
#[derive(Default)]
pub struct RecordingSurface {
    has_background: Cell<bool>,
    calls: RefCell<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that already shows an earlier background.
    pub fn with_background() -> Self {
        let surface = Self::default();
        surface.has_background.set(true);
        surface
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.borrow().clone()
    }

    /// Reconstructs how each image reached the primary layer.
    pub fn presentations(&self) -> Vec<Presentation> {
        let mut presentations = Vec::new();
        let mut fading = false;
        for call in self.calls.borrow().iter() {
            match call {
                SurfaceCall::PaintOverlay(..) => {
                    presentations.push(Presentation::Faded);
                    fading = true;
                }
                SurfaceCall::PaintPrimary(..) if fading => fading = false,
                SurfaceCall::PaintPrimary(..) => presentations.push(Presentation::Direct),
                _ => {}
            }
        }
        presentations
    }

    /// Dimensions of the last image committed to the primary layer.
    pub fn last_painted(&self) -> Option<(u32, u32)> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            SurfaceCall::PaintPrimary(w, h) => Some((*w, *h)),
            _ => None,
        })
    }

    /// The attribution currently shown.
    pub fn photo_info(&self) -> Option<String> {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find_map(|call| match call {
                SurfaceCall::PhotoInfo(text) => Some(text.clone()),
                _ => None,
            })
            .flatten()
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl BackgroundSurface for RecordingSurface {
    fn has_background(&self) -> bool {
        self.has_background.get()
    }

    fn paint_primary(&self, image: &DecodedImage) {
        self.has_background.set(true);
        self.record(SurfaceCall::PaintPrimary(image.width, image.height));
    }

    fn set_primary_opacity(&self, opacity: f32) {
        self.record(SurfaceCall::PrimaryOpacity(opacity));
    }

    fn paint_overlay(&self, image: &DecodedImage) {
        self.record(SurfaceCall::PaintOverlay(image.width, image.height));
    }

    fn set_overlay_opacity(&self, opacity: f32) {
        self.record(SurfaceCall::OverlayOpacity(opacity));
    }

    fn clear_overlay(&self) {
        self.record(SurfaceCall::ClearOverlay);
    }

    fn set_transition(&self, duration: Duration) {
        self.record(SurfaceCall::Transition(duration));
    }
}

impl PhotoInfoDisplay for RecordingSurface {
    fn show_photo_info(&self, text: Option<&str>) {
        self.record(SurfaceCall::PhotoInfo(text.map(str::to_string)));
    }
}

/// Timer that only fires when told to. Pending tasks are kept in a list so
/// a missing `stop` shows up as more than one pending task.
#[derive(Default)]
pub struct ManualTimer {
    pending: RefCell<Vec<(Duration, TimerTask)>>,
    starts: Cell<usize>,
    stops: Cell<usize>,
    max_pending: Cell<usize>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.starts.get()
    }

    pub fn stops(&self) -> usize {
        self.stops.get()
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending.get()
    }

    pub fn pending_delay(&self) -> Option<Duration> {
        self.pending.borrow().last().map(|(delay, _)| *delay)
    }

    /// Runs the most recently started task to completion.
    pub async fn fire(&self) {
        let task = self.pending.borrow_mut().pop().map(|(_, task)| task);
        if let Some(task) = task {
            task.await;
        }
    }
}

impl TimerSlot for ManualTimer {
    fn start(&self, after: Duration, task: TimerTask) {
        self.starts.set(self.starts.get() + 1);
        let mut pending = self.pending.borrow_mut();
        pending.push((after, task));
        self.max_pending.set(self.max_pending.get().max(pending.len()));
    }

    fn stop(&self) {
        self.stops.set(self.stops.get() + 1);
        self.pending.borrow_mut().clear();
    }
}

fn encode_png(image: ImageBuffer<Rgb<u8>, Vec<u8>>) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("PNG encoding of a test image");
    out.into_inner()
}

/// PNG of pseudo-random pixels. Noise barely compresses, so the file is
/// close to `3 * width * height` bytes.
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let image = ImageBuffer::from_fn(width, height, |_, _| {
        let mut channel = || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (state >> 56) as u8
        };
        Rgb([channel(), channel(), channel()])
    });
    encode_png(image)
}

/// A tiny solid PNG.
pub fn small_png() -> Vec<u8> {
    encode_png(ImageBuffer::from_pixel(4, 4, Rgb([30, 90, 160])))
}
