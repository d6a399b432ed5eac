// SPDX-License-Identifier: MIT OR Apache-2.0
//! Caret blinking.
//!
//! The hero line renders a caret next to its animated text, fading in and
//! out at a fixed cadence. Modelled as the simplest stepper of the family:
//! each micro-step toggles visibility, forever, until cancelled.

use crate::driver::{Driver, Stepper};
use crate::scheduler::Scheduler;
use std::sync::Arc;

/// Blink interval used by the hero caret, in milliseconds.
pub const DEFAULT_BLINK_INTERVAL_MS: u64 = 600;

/// State machine toggling caret visibility at a fixed cadence.
#[derive(Debug, Clone)]
pub struct CaretState {
    /// Current phase; starts visible.
    visible: bool,
    /// Delay between toggles, in milliseconds.
    interval_ms: u64,
}

impl CaretState {
    /// Caret starts visible.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            visible: true,
            interval_ms,
        }
    }

    /// Toggle visibility. Never halts on its own.
    pub fn step(&mut self) -> Option<u64> {
        self.visible = !self.visible;
        Some(self.interval_ms)
    }

    /// Current phase.
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Stepper for CaretState {
    fn step(&mut self) -> Option<u64> {
        CaretState::step(self)
    }
}

/// Spawned caret: a [`CaretState`] driven on a scheduler.
pub struct CaretBlink {
    driver: Driver<CaretState>,
}

impl CaretBlink {
    /// Start blinking; the first toggle fires one interval from now.
    pub fn spawn(scheduler: Arc<dyn Scheduler>, interval_ms: u64) -> Self {
        Self {
            driver: Driver::spawn(scheduler, CaretState::new(interval_ms), interval_ms),
        }
    }

    /// Current phase.
    pub fn is_visible(&self) -> bool {
        self.driver.with(CaretState::is_visible)
    }

    /// Stop blinking, leaving the phase wherever it is. Idempotent.
    pub fn cancel(&self) {
        self.driver.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use std::time::Duration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_toggles_every_interval() {
        let scheduler = Arc::new(ManualScheduler::new());
        let caret = CaretBlink::spawn(Arc::clone(&scheduler) as Arc<dyn Scheduler>, 600);

        assert!(caret.is_visible());
        scheduler.advance(ms(599));
        assert!(caret.is_visible());
        scheduler.advance(ms(1));
        assert!(!caret.is_visible());
        scheduler.advance(ms(600));
        assert!(caret.is_visible());
    }

    #[test]
    fn test_cancel_stops_blinking() {
        let scheduler = Arc::new(ManualScheduler::new());
        let caret = CaretBlink::spawn(Arc::clone(&scheduler) as Arc<dyn Scheduler>, 600);

        scheduler.advance(ms(600));
        assert!(!caret.is_visible());

        caret.cancel();
        scheduler.advance(ms(6000));
        assert!(!caret.is_visible());
        assert_eq!(scheduler.pending(), 0);
    }
}
