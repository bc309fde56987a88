//! Timer scheduling facilities.
//!
//! Every timing combinator in this crate is driven by a [`Scheduler`]: a
//! handle that can run a callback once after a delay and cancel it again.
//! The scheduler is the only environment dependency of the combinators;
//! everything else is in-process state.
//!
//! Two implementations are provided:
//!
//! - [`VirtualScheduler`]: a deterministic, manually advanced clock. Time only
//!   moves when [`VirtualScheduler::advance`] (or one of its siblings) is
//!   called, which makes timing behaviour reproducible in tests.
//! - [`TokioScheduler`] (feature `async`): runs callbacks on a tokio runtime.
//!
//! # Examples
//!
//! ```rust
//! use lambars_timing::scheduler::{Scheduler, VirtualScheduler};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! let clock = VirtualScheduler::new();
//! let fired = Arc::new(AtomicUsize::new(0));
//! let fired_clone = Arc::clone(&fired);
//!
//! clock.schedule(
//!     Duration::from_millis(100),
//!     Box::new(move || {
//!         fired_clone.fetch_add(1, Ordering::SeqCst);
//!     }),
//! );
//!
//! clock.advance(Duration::from_millis(99));
//! assert_eq!(fired.load(Ordering::SeqCst), 0);
//! clock.advance(Duration::from_millis(1));
//! assert_eq!(fired.load(Ordering::SeqCst), 1);
//! ```

#[cfg(feature = "async")]
mod runtime;
mod virtual_clock;

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[cfg(feature = "async")]
pub use runtime::TokioScheduler;
pub use virtual_clock::VirtualScheduler;

/// A callback scheduled to run once.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Opaque identifier of one scheduled task.
///
/// Identifiers are never zero, so "no timer" is always spelled
/// `Option<TimerId>::None` rather than a sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(NonZeroU64);

impl TimerId {
    /// Returns the raw numeric value of this identifier.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "timer#{}", self.0)
    }
}

/// Monotonic source of [`TimerId`]s, one per scheduler instance.
#[derive(Debug)]
pub(crate) struct TimerIdSource {
    next: AtomicU64,
}

impl TimerIdSource {
    pub(crate) const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_id(&self) -> TimerId {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        TimerId(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }
}

/// A facility that runs callbacks after a delay.
///
/// Implementations are cheap handles: cloning a scheduler yields another
/// handle to the same underlying timer queue.
///
/// # Contract
///
/// - [`schedule`](Scheduler::schedule) never runs the task synchronously; the
///   task runs later, on whatever context the scheduler drives callbacks from.
/// - [`cancel`](Scheduler::cancel) is best effort and idempotent. Cancelling
///   an identifier that already fired, was already cancelled, or was never
///   issued by this scheduler does nothing.
pub trait Scheduler: Clone + Send + Sync + 'static {
    /// Schedules `task` to run once, no earlier than `delay` from now.
    fn schedule(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancels a previously scheduled task.
    fn cancel(&self, id: TimerId);

    /// Schedules `task` for the soonest possible tick.
    fn defer(&self, task: Task) -> TimerId {
        self.schedule(Duration::ZERO, task)
    }
}
