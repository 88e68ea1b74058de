//! Service layer for the background refresh pipeline.
//!
//! Each service talks to the UI only through a small trait so it can be
//! driven by fakes in tests.

pub mod background_controller;
pub mod background_presenter;
pub mod expiration_scheduler;

pub use background_controller::{BackgroundController, RefreshOutcome};
pub use background_presenter::BackgroundPresenter;
pub use expiration_scheduler::{ExpirationScheduler, TimerTask};
