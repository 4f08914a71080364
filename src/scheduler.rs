//! Polling scheduler: the per-sensor self-rearming tick loop.
//!
//! One cooperative tokio task drives sampling for one sensor. Each tick
//! schedules the next one explicitly, so there is no free-running timer and
//! no drift from a missed cancellation. The interval is re-read at every
//! re-arm decision, which is what makes a concurrent `delay` write take
//! effect on the next cycle rather than retroactively.
//!
//! State machine:
//!
//! ```text
//! Idle --enable--> Armed --timer fires--> Ticking --interval > 0--> Armed
//!                    ^                       |
//!                    |                       +--interval <= 0--> Halted
//!                    +------------enable (explicit)------------------+
//! ```
//!
//! Halting on a non-positive interval is an error-level diagnostic and a
//! silent stop: the consumer is not told, and only an explicit enable
//! recovers. This is the intended contract, not an oversight.

use crate::types::SensorKind;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error};

struct SchedState {
    kind: SensorKind,
    enabled: AtomicBool,
    delay_ms: AtomicI32,
    /// Bumped on every enable and disable; a running loop exits as soon as
    /// it observes a generation other than its own, so re-enabling never
    /// produces double timers.
    generation: AtomicU64,
}

impl SchedState {
    fn is_current(&self, my_gen: u64) -> bool {
        self.enabled.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == my_gen
    }
}

/// Self-rearming poll timer for one sensor.
///
/// Enable/disable and the interval are plain atomics, deliberately outside
/// the batch lock: an enable/disable race against an in-flight tick must
/// resolve to "the tick completes, but no re-arm happens if disable won the
/// race before the re-arm decision point", and atomics give exactly that.
pub struct PollScheduler {
    state: Arc<SchedState>,
}

impl PollScheduler {
    /// Create an idle scheduler with the given initial interval.
    pub fn new(kind: SensorKind, delay_ms: i32) -> Self {
        Self {
            state: Arc::new(SchedState {
                kind,
                enabled: AtomicBool::new(false),
                delay_ms: AtomicI32::new(delay_ms),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Whether sampling is currently active.
    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::SeqCst)
    }

    /// Current poll interval in milliseconds.
    pub fn delay_ms(&self) -> i32 {
        self.state.delay_ms.load(Ordering::SeqCst)
    }

    /// Update the poll interval.
    ///
    /// Does not arm or disarm anything; the new value is picked up at the
    /// next re-arm decision.
    pub fn set_delay_ms(&self, delay_ms: i32) {
        self.state.delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    /// Arm the scheduler and start the tick loop.
    ///
    /// Enabling while already enabled re-arms from scratch: the previous
    /// loop is invalidated and a fresh one starts with a full interval.
    /// `tick` is invoked once per timer expiry; the first invocation happens
    /// no earlier than the current interval after this call.
    pub fn enable<F, Fut>(&self, tick: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let my_gen = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.enabled.store(true, Ordering::SeqCst);
        debug!(sensor = %self.state.kind, delay_ms = self.delay_ms(), "poll armed");

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            loop {
                let delay = state.delay_ms.load(Ordering::SeqCst);
                if delay <= 0 {
                    // Silent stop: recovery requires an explicit enable.
                    error!(sensor = %state.kind, delay_ms = delay, "poll halted: non-positive interval");
                    return;
                }
                sleep(Duration::from_millis(delay as u64)).await;

                // A disable (or re-enable) while the timer was pending
                // cancels this tick before any sampling happens.
                if !state.is_current(my_gen) {
                    return;
                }

                tick().await;

                // The tick itself always completes; only the re-arm is
                // abandoned when disable won the race.
                if !state.is_current(my_gen) {
                    return;
                }
            }
        });
    }

    /// Disarm the scheduler.
    ///
    /// A pending (not yet fired) tick is cancelled; a tick already running
    /// completes but does not reschedule. Best-effort-soon, never blocking.
    pub fn disable(&self) {
        self.state.enabled.store(false, Ordering::SeqCst);
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        debug!(sensor = %self.state.kind, "poll disarmed");
    }
}

/// The tick loop only shares the inner state, not the scheduler itself, so
/// dropping the handle must disarm explicitly or the loop would keep running
/// against state nothing can reach anymore.
impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.disable();
    }
}
