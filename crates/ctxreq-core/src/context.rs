//! Execution context: the caller's time budget for one logical call.
//!
//! An `ExecContext` carries an optional absolute deadline and a one-shot
//! cancellation signal. Once the signal fires (explicit `cancel()` or the
//! deadline passing) it stays fired, and `err()` keeps returning the same
//! error. Clones share the same signal.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Error reported by a context whose budget is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// `cancel()` was called before the deadline.
    #[error("context canceled")]
    Canceled,
    /// The deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

struct Inner {
    deadline: Option<Instant>,
    fired: Mutex<Option<ContextError>>,
    cond: Condvar,
}

/// Shared deadline/cancellation capability. Cheap to clone.
#[derive(Clone)]
pub struct ExecContext {
    inner: Arc<Inner>,
}

impl ExecContext {
    fn build(deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(Inner {
                deadline,
                fired: Mutex::new(None),
                cond: Condvar::new(),
            }),
        }
    }

    /// Context with no deadline; only fires on `cancel()`.
    pub fn background() -> Self {
        Self::build(None)
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(Instant::now() + timeout))
    }

    /// Context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    /// Absolute deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left until the deadline (zero once passed). `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fire the cancellation signal. No-op if it already fired.
    pub fn cancel(&self) {
        let mut fired = self.lock();
        if fired.is_none() {
            *fired = Some(ContextError::Canceled);
            self.inner.cond.notify_all();
        }
    }

    /// The error the context fired with, or `None` while budget remains.
    pub fn err(&self) -> Option<ContextError> {
        let mut fired = self.lock();
        self.observe(&mut fired)
    }

    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// Sleep for up to `timeout`, returning early when the context fires.
    /// Returns the context error if it fired before or during the wait.
    pub fn wait(&self, timeout: Duration) -> Option<ContextError> {
        let until = Instant::now() + timeout;
        let mut fired = self.lock();
        loop {
            if let Some(e) = self.observe(&mut fired) {
                return Some(e);
            }
            let now = Instant::now();
            if now >= until {
                return None;
            }
            let mut wake = until;
            if let Some(d) = self.inner.deadline {
                wake = wake.min(d);
            }
            let (guard, _) = self
                .inner
                .cond
                .wait_timeout(fired, wake.saturating_duration_since(now))
                .unwrap_or_else(|e| e.into_inner());
            fired = guard;
        }
    }

    /// True when both handles observe the same signal (one is a clone of the other).
    pub fn shares_signal_with(&self, other: &ExecContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> MutexGuard<'_, Option<ContextError>> {
        self.inner.fired.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Latch deadline expiry into the fired slot so later reads agree.
    fn observe(&self, fired: &mut Option<ContextError>) -> Option<ContextError> {
        if fired.is_none() {
            if let Some(d) = self.inner.deadline {
                if Instant::now() >= d {
                    *fired = Some(ContextError::DeadlineExceeded);
                    self.inner.cond.notify_all();
                }
            }
        }
        *fired
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecContext")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish()
    }
}
