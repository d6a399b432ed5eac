// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deferred-callback scheduling.
//!
//! Every animation in this crate waits by scheduling a callback, never by
//! blocking, so the whole core runs against one small trait: run a callback
//! once after a delay, or cancel it before it fires. Two implementations are
//! provided:
//! - [`ThreadScheduler`] for real time (a worker thread over an ordered
//!   due-queue)
//! - [`ManualScheduler`] for virtual time (tests and deterministic demos
//!   drive the clock explicitly)

use parking_lot::{Condvar, Mutex};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A callback run once by a [`Scheduler`].
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Identifies a pending callback for cancellation.
///
/// Tokens are only meaningful on the scheduler that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

/// Host scheduling collaborator: run a callback once after a delay.
///
/// Contract:
/// - The callback is never invoked from inside [`schedule_after`]
///   (zero delays included); it fires later, from the scheduler's driving
///   context. Callers may therefore hold their own locks across the call.
/// - [`cancel`] is idempotent: cancelling a token that already fired, was
///   already cancelled, or was never issued is a no-op.
///
/// [`schedule_after`]: Scheduler::schedule_after
/// [`cancel`]: Scheduler::cancel
pub trait Scheduler: Send + Sync {
    /// Schedule `callback` to run once, `delay` from now.
    fn schedule_after(&self, delay: Duration, callback: TimerCallback) -> TimerToken;

    /// Drop a pending callback before it fires.
    fn cancel(&self, token: TimerToken);
}

/// Pending entries ordered by deadline, then by issue order.
type DueQueue<T> = BTreeMap<(T, u64), TimerCallback>;

/// Real-time [`Scheduler`] backed by a worker thread.
///
/// Callbacks run on the worker thread in deadline order. Dropping the
/// scheduler stops the worker; callbacks still pending at that point are
/// dropped, not run.
pub struct ThreadScheduler {
    /// Queue and wakeup state shared with the worker.
    shared: Arc<TimerShared>,
    /// Worker handle, joined on drop.
    worker: Option<std::thread::JoinHandle<()>>,
}

struct TimerShared {
    /// Pending callbacks plus the shutdown flag.
    queue: Mutex<TimerQueue>,
    /// Wakes the worker on insert and on shutdown.
    wake: Condvar,
    /// Source of unique token values.
    next_token: AtomicU64,
}

struct TimerQueue {
    entries: DueQueue<Instant>,
    shutdown: bool,
}

impl ThreadScheduler {
    /// Start the worker thread with an empty queue.
    pub fn new() -> Self {
        let shared = Arc::new(TimerShared {
            queue: Mutex::new(TimerQueue {
                entries: BTreeMap::new(),
                shutdown: false,
            }),
            wake: Condvar::new(),
            next_token: AtomicU64::new(0),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::spawn(move || worker_loop(&worker_shared));
        tracing::debug!("Timer worker started");
        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Number of callbacks waiting to fire.
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().entries.len()
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_after(&self, delay: Duration, callback: TimerCallback) -> TimerToken {
        let token = TimerToken(self.shared.next_token.fetch_add(1, Ordering::Relaxed));
        let deadline = Instant::now() + delay;
        {
            let mut queue = self.shared.queue.lock();
            queue.entries.insert((deadline, token.0), callback);
        }
        self.shared.wake.notify_one();
        token
    }

    fn cancel(&self, token: TimerToken) {
        let mut queue = self.shared.queue.lock();
        queue.entries.retain(|&(_, seq), _| seq != token.0);
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        {
            let mut queue = self.shared.queue.lock();
            queue.shutdown = true;
        }
        self.shared.wake.notify_one();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        tracing::debug!("Timer worker stopped");
    }
}

/// Pops due entries and runs them with the queue unlocked, sleeping on the
/// condvar until the next deadline otherwise.
fn worker_loop(shared: &TimerShared) {
    let mut due: Vec<TimerCallback> = Vec::new();
    loop {
        {
            let mut queue = shared.queue.lock();
            loop {
                if queue.shutdown {
                    return;
                }
                let now = Instant::now();
                while queue
                    .entries
                    .first_key_value()
                    .is_some_and(|(&(deadline, _), _)| deadline <= now)
                {
                    if let Some((_, callback)) = queue.entries.pop_first() {
                        due.push(callback);
                    }
                }
                if !due.is_empty() {
                    break;
                }
                let next_deadline = queue.entries.first_key_value().map(|(&(deadline, _), _)| deadline);
                match next_deadline {
                    Some(deadline) => {
                        let timeout = deadline.saturating_duration_since(Instant::now());
                        let _ = shared.wake.wait_for(&mut queue, timeout);
                    }
                    None => shared.wake.wait(&mut queue),
                }
            }
        }
        // Callbacks may reschedule, so the queue stays unlocked while they run.
        for callback in due.drain(..) {
            callback();
        }
    }
}

/// Virtual-time [`Scheduler`] driven by explicit [`advance`] calls.
///
/// Nothing fires until the clock is advanced. During [`advance`] the clock
/// jumps to each entry's exact deadline before its callback runs, so a
/// callback that schedules a successor lands it at the precise virtual
/// instant; successors falling inside the advanced window fire within the
/// same call. Intended to be driven from one thread.
///
/// [`advance`]: ManualScheduler::advance
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<ManualQueue>,
    next_token: AtomicU64,
}

#[derive(Default)]
struct ManualQueue {
    /// Virtual clock; starts at zero.
    now: Duration,
    entries: DueQueue<Duration>,
}

impl ManualScheduler {
    /// Scheduler with the clock at zero and nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `dt`, firing everything that comes due.
    ///
    /// Entries with equal deadlines fire in scheduling order.
    pub fn advance(&self, dt: Duration) {
        let target = self.queue.lock().now + dt;
        loop {
            let callback = {
                let mut queue = self.queue.lock();
                let next_due = queue
                    .entries
                    .first_key_value()
                    .map(|(&(due, _), _)| due)
                    .filter(|&due| due <= target);
                match next_due {
                    Some(due) => {
                        queue.now = due;
                        queue.entries.pop_first().map(|(_, callback)| callback)
                    }
                    None => {
                        queue.now = target;
                        None
                    }
                }
            };
            match callback {
                Some(callback) => callback(),
                None => break,
            }
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.queue.lock().now
    }

    /// Number of callbacks waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue.lock().entries.len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, callback: TimerCallback) -> TimerToken {
        let token = TimerToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let mut queue = self.queue.lock();
        let due = queue.now + delay;
        queue.entries.insert((due, token.0), callback);
        token
    }

    fn cancel(&self, token: TimerToken) {
        let mut queue = self.queue.lock();
        queue.entries.retain(|&(_, seq), _| seq != token.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> TimerCallback) {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let push = {
            let log = Arc::clone(&log);
            move |label: &'static str| -> TimerCallback {
                let log = Arc::clone(&log);
                Box::new(move || log.lock().push(label))
            }
        };
        (log, push)
    }

    #[test]
    fn test_manual_fires_in_deadline_order() {
        let scheduler = ManualScheduler::new();
        let (log, entry) = recorder();

        scheduler.schedule_after(ms(30), entry("late"));
        scheduler.schedule_after(ms(10), entry("early"));
        scheduler.schedule_after(ms(20), entry("middle"));

        scheduler.advance(ms(40));
        assert_eq!(*log.lock(), vec!["early", "middle", "late"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_manual_equal_deadlines_fire_in_schedule_order() {
        let scheduler = ManualScheduler::new();
        let (log, entry) = recorder();

        scheduler.schedule_after(ms(10), entry("first"));
        scheduler.schedule_after(ms(10), entry("second"));

        scheduler.advance(ms(10));
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_manual_does_not_fire_early() {
        let scheduler = ManualScheduler::new();
        let (log, entry) = recorder();

        scheduler.schedule_after(ms(100), entry("later"));
        scheduler.advance(ms(99));
        assert!(log.lock().is_empty());
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(ms(1));
        assert_eq!(*log.lock(), vec!["later"]);
    }

    #[test]
    fn test_manual_cancel_removes_entry() {
        let scheduler = ManualScheduler::new();
        let (log, entry) = recorder();

        let doomed = scheduler.schedule_after(ms(10), entry("doomed"));
        scheduler.schedule_after(ms(20), entry("kept"));
        scheduler.cancel(doomed);
        assert_eq!(scheduler.pending(), 1);

        scheduler.advance(ms(30));
        assert_eq!(*log.lock(), vec!["kept"]);

        // Cancelling again, or after firing, is a no-op.
        scheduler.cancel(doomed);
    }

    #[test]
    fn test_manual_zero_delay_fires_from_advance_not_inline() {
        let scheduler = ManualScheduler::new();
        let (log, entry) = recorder();

        scheduler.schedule_after(ms(0), entry("deferred"));
        assert!(log.lock().is_empty());

        scheduler.advance(ms(0));
        assert_eq!(*log.lock(), vec!["deferred"]);
    }

    #[test]
    fn test_manual_nested_schedule_fires_within_same_advance() {
        let scheduler = Arc::new(ManualScheduler::new());
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let inner_log = Arc::clone(&log);
        let inner_scheduler = Arc::clone(&scheduler);
        scheduler.schedule_after(
            ms(10),
            Box::new(move || {
                inner_log.lock().push("outer");
                let nested_log = Arc::clone(&inner_log);
                inner_scheduler.schedule_after(ms(10), Box::new(move || nested_log.lock().push("nested")));
            }),
        );

        // 10ms outer + 10ms nested both fall inside the 30ms window.
        scheduler.advance(ms(30));
        assert_eq!(*log.lock(), vec!["outer", "nested"]);
        assert_eq!(scheduler.now(), ms(30));
    }

    #[test]
    fn test_manual_nested_schedule_lands_at_exact_virtual_instant() {
        let scheduler = Arc::new(ManualScheduler::new());
        let fired_at: Arc<Mutex<Option<Duration>>> = Arc::new(Mutex::new(None));

        let inner_scheduler = Arc::clone(&scheduler);
        let inner_fired = Arc::clone(&fired_at);
        scheduler.schedule_after(
            ms(7),
            Box::new(move || {
                let probe = Arc::clone(&inner_scheduler);
                let fired = Arc::clone(&inner_fired);
                inner_scheduler.schedule_after(ms(5), Box::new(move || *fired.lock() = Some(probe.now())));
            }),
        );

        scheduler.advance(ms(100));
        // Due at 7 + 5, regardless of how far the window overshoots.
        assert_eq!(*fired_at.lock(), Some(ms(12)));
    }

    #[test]
    fn test_manual_now_tracks_advances() {
        let scheduler = ManualScheduler::new();
        assert_eq!(scheduler.now(), ms(0));
        scheduler.advance(ms(5));
        scheduler.advance(ms(7));
        assert_eq!(scheduler.now(), ms(12));
    }

    #[test]
    fn test_thread_scheduler_fires_callback() {
        let scheduler = ThreadScheduler::new();
        let (tx, rx) = mpsc::channel();

        scheduler.schedule_after(
            ms(20),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );

        rx.recv_timeout(Duration::from_secs(2))
            .expect("callback should fire within the timeout");
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_thread_scheduler_cancel_before_fire() {
        let scheduler = ThreadScheduler::new();
        let (tx, rx) = mpsc::channel();

        let token = scheduler.schedule_after(
            ms(150),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        scheduler.cancel(token);
        assert_eq!(scheduler.pending(), 0);

        std::thread::sleep(ms(250));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_thread_scheduler_drop_joins_worker() {
        let scheduler = ThreadScheduler::new();
        let (tx, rx) = mpsc::channel();
        scheduler.schedule_after(
            Duration::from_secs(60),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );

        // Dropping must not wait out pending deadlines, and pending
        // callbacks must never run afterwards.
        drop(scheduler);
        assert!(rx.try_recv().is_err());
    }
}
