//! Refreshes the background when the cached entry expires.
//!
//! There is one timer slot. Every call to [`ExpirationScheduler::rearm`]
//! stops the pending timer before computing a new deadline, so at most one
//! timer is ever pending no matter how often it is called (on startup, after
//! a refresh, or when the cache duration setting changes).

use crate::background_cache::BackgroundCache;
use crate::config::MAX_TIMER_DELAY;
use log::{debug, info, warn};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

/// Work run on the event loop when a timer fires.
pub type TimerTask = Pin<Box<dyn Future<Output = ()>>>;

/// A single re-armable one-shot timer.
pub trait TimerSlot {
    /// Runs `task` once `after` has elapsed, replacing any pending task.
    fn start(&self, after: Duration, task: TimerTask);
    /// Cancels the pending task, if any.
    fn stop(&self);
}

/// Result of one [`ExpirationScheduler::rearm`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Nothing cached, so nothing to expire.
    Idle,
    Scheduled(Duration),
    /// The deadline was implausibly far away.
    Refused(Duration),
    /// Still overdue after an immediate refresh.
    Overdue,
}

pub struct ExpirationScheduler {
    cache: Rc<BackgroundCache>,
    timer: Rc<dyn TimerSlot>,
    on_expire: Box<dyn Fn() -> TimerTask>,
}

impl ExpirationScheduler {
    /// `on_expire` produces one refresh cycle each time it is called.
    pub fn new(
        cache: Rc<BackgroundCache>,
        timer: Rc<dyn TimerSlot>,
        on_expire: impl Fn() -> TimerTask + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            cache,
            timer,
            on_expire: Box::new(on_expire),
        })
    }

    /// Cancels any pending timer and arms a new one for the current entry.
    pub fn rearm(self: &Rc<Self>) -> Pin<Box<dyn Future<Output = ArmOutcome>>> {
        let scheduler = Rc::clone(self);
        Box::pin(async move {
            scheduler.timer.stop();

            let mut refreshed = false;
            loop {
                let Some(remaining) = scheduler.cache.remaining_millis().await else {
                    debug!("No cached background, expiration timer idle");
                    return ArmOutcome::Idle;
                };

                if remaining <= 0 {
                    if refreshed {
                        warn!("Background still expired after refresh, not rescheduling");
                        return ArmOutcome::Overdue;
                    }
                    info!("Cached background already expired, refreshing now");
                    (scheduler.on_expire)().await;
                    refreshed = true;
                    continue;
                }

                let delay = Duration::from_millis(remaining as u64);
                // Unreachable while durations are clamped to MAX_CACHE_HOURS
                // and ages to >= 0. Kept as a backstop.
                if delay > MAX_TIMER_DELAY {
                    warn!("Refusing to arm expiration timer {:?} ahead", delay);
                    return ArmOutcome::Refused(delay);
                }

                let fired = Rc::clone(&scheduler);
                scheduler.timer.start(
                    delay,
                    Box::pin(async move {
                        info!("Cached background expired, refreshing");
                        (fired.on_expire)().await;
                        fired.rearm().await;
                    }),
                );
                info!("Expiration timer armed for {} s", delay.as_secs());
                return ArmOutcome::Scheduled(delay);
            }
        })
    }

    /// Cancels the pending timer.
    pub fn stop(&self) {
        self.timer.stop();
    }
}
