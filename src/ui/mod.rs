//! UI module for handling user interactions and UI updates.
//!
//! Threading model:
//! - `slint::spawn_local`: every refresh cycle and settings change runs on the
//!   UI thread, wrapped in `async_compat::Compat` for network access
//! - `async_std::task::spawn_blocking`: image decoding, awaited from the UI
//!   thread
//! - `slint::Timer`: the single expiration timer

pub mod handlers;
mod slint_surface;
mod state_helpers;
mod timer_slot;

pub use handlers::{setup_handlers, spawn_ui_task};
pub use slint_surface::SlintSurface;
pub use state_helpers::*;
pub use timer_slot::SlintTimerSlot;
