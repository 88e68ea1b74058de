//! [`TimerSlot`] on top of a single-shot `slint::Timer`.

use crate::services::expiration_scheduler::{TimerSlot, TimerTask};
use async_compat::Compat;
use log::error;
use slint::{Timer, TimerMode};
use std::cell::Cell;
use std::time::Duration;

#[derive(Default)]
pub struct SlintTimerSlot {
    timer: Timer,
}

impl SlintTimerSlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimerSlot for SlintTimerSlot {
    fn start(&self, after: Duration, task: TimerTask) {
        let task = Cell::new(Some(task));
        // Timer::start replaces whatever was pending
        self.timer.start(TimerMode::SingleShot, after, move || {
            let Some(task) = task.take() else {
                return;
            };
            if let Err(e) = slint::spawn_local(Compat::new(task)) {
                error!("Failed to run expiration task: {}", e);
            }
        });
    }

    fn stop(&self) {
        self.timer.stop();
    }
}
