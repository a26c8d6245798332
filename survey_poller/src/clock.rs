//! Time and cancellation for the polling loop.
//!
//! The loop never reads the wall clock directly. It goes through a [`Clock`],
//! so that tests can run many iterations in virtual time.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A cooperative stop signal, shared between the poller and whoever wants to
/// stop it (a Ctrl-C handler, a consumer, a test).
///
/// The poller only looks at it between iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *relock(lock) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *relock(&self.inner.0)
    }

    /// Blocks for at most `timeout`. Returns early, with `true`, as soon as
    /// the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = relock(lock);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(|e| e.into_inner());
        *guard
    }
}

// A panicking holder cannot leave the flag half-written.
fn relock(lock: &Mutex<bool>) -> MutexGuard<'_, bool> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}

pub trait Clock {
    /// Monotonic time since the clock was created.
    fn elapsed(&self) -> Duration;

    /// Waits for `duration`, or less if `cancel` fires.
    fn pause(&self, duration: Duration, cancel: &CancelToken);
}

#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> SystemClock {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn pause(&self, duration: Duration, cancel: &CancelToken) {
        cancel.wait_timeout(duration);
    }
}

/// Virtual time. Pausing moves the clock forward instantly.
///
/// Clones share the same time, so a test can keep a handle and advance it
/// from inside a source to simulate slow fetches.
///
/// ```
/// use std::time::Duration;
/// use survey_poller::clock::{CancelToken, Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.pause(Duration::from_secs(30), &CancelToken::new());
/// assert_eq!(clock.elapsed(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    /// Every pause requested so far, in order.
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn pause(&self, duration: Duration, _cancel: &CancelToken) {
        self.pauses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
    }
}
