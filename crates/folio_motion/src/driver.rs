// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timer-chain driver behind the spawned animation handles.
//!
//! A driven state machine advances one micro-step per scheduled callback,
//! and every callback schedules at most one successor, so a single advance
//! is pending per handle at any moment. Cancellation flips a flag inside
//! the shared cell; a callback that was already queued observes the flag
//! under the lock and returns without touching the machine.

use crate::scheduler::{Scheduler, TimerToken};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A state machine advanced one micro-step at a time.
///
/// `step` performs one micro-step and returns the delay to the next one in
/// milliseconds, or `None` once there is nothing further to do.
pub(crate) trait Stepper: Send + 'static {
    /// Advance by one micro-step.
    fn step(&mut self) -> Option<u64>;
}

/// Cell shared between a handle and its in-flight callbacks.
struct DriverShared<S> {
    /// Scheduler the chain runs on.
    scheduler: Arc<dyn Scheduler>,
    /// Machine plus chain bookkeeping, guarded as one unit.
    state: Mutex<DriverState<S>>,
}

struct DriverState<S> {
    stepper: S,
    /// Token of the single pending advance, if any.
    pending: Option<TimerToken>,
    /// Set once by `cancel`; checked before every mutation.
    cancelled: bool,
}

/// Owning handle for a driven state machine. Cancels on drop.
pub(crate) struct Driver<S: Stepper> {
    shared: Arc<DriverShared<S>>,
}

impl<S: Stepper> Driver<S> {
    /// Start driving `stepper`, first advance `initial_delay_ms` from now.
    pub(crate) fn spawn(scheduler: Arc<dyn Scheduler>, stepper: S, initial_delay_ms: u64) -> Self {
        let shared = Arc::new(DriverShared {
            scheduler,
            state: Mutex::new(DriverState {
                stepper,
                pending: None,
                cancelled: false,
            }),
        });
        // The state lock is held across the first schedule so the token is
        // recorded before any callback can observe the cell.
        {
            let mut state = shared.state.lock();
            let token = schedule_advance(&shared, initial_delay_ms);
            state.pending = Some(token);
        }
        Self { shared }
    }

    /// Run `f` against the machine under the lock.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.state.lock().stepper)
    }

    /// Stop the chain. Idempotent; the machine is never touched again.
    pub(crate) fn cancel(&self) {
        let token = {
            let mut state = self.shared.state.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            state.pending.take()
        };
        if let Some(token) = token {
            self.shared.scheduler.cancel(token);
        }
        tracing::trace!("Advance chain cancelled");
    }
}

impl<S: Stepper> Drop for Driver<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Perform one micro-step and queue the successor, unless cancelled.
fn advance<S: Stepper>(shared: &Arc<DriverShared<S>>) {
    let mut state = shared.state.lock();
    if state.cancelled {
        return;
    }
    state.pending = None;
    if let Some(delay_ms) = state.stepper.step() {
        let token = schedule_advance(shared, delay_ms);
        state.pending = Some(token);
    }
}

fn schedule_advance<S: Stepper>(shared: &Arc<DriverShared<S>>, delay_ms: u64) -> TimerToken {
    let weak = Arc::downgrade(shared);
    shared.scheduler.schedule_after(
        Duration::from_millis(delay_ms),
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                advance(&shared);
            }
        }),
    )
}
