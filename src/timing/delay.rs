//! Deferred and delayed invocation.
//!
//! Unlike the debounce and throttle families, these dispatchers share no state
//! between calls: every call schedules its own invocation, and the returned
//! [`InvocationControl`] governs that invocation alone.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, trace};

use super::control::{Controllable, InvocationControl};
use super::slot::{Ticket, TimerSlot};
use super::Target;
use crate::scheduler::{Scheduler, Task};

/// When a [`Delayed`] dispatcher schedules its invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    /// The scheduler's soonest tick.
    Tick,
    /// A fixed delay.
    For(Duration),
}

/// Serializes every event of one dispatcher: calls, fires, clears and
/// flushes of all its pending invocations.
type Gate = Arc<ReentrantMutex<()>>;

/// Dispatcher returned by [`delay`] and [`defer`].
///
/// Each [`call`](Self::call) schedules one independent invocation of the
/// target with that call's arguments. Invocations never overlap: a target
/// still running blocks the next one until it returns, even when timers fire
/// on different threads.
pub struct Delayed<A, S> {
    scheduler: S,
    target: Target<A>,
    wait: Wait,
    gate: Gate,
}

/// Dispatcher returned by [`defer`].
pub type Deferred<A, S> = Delayed<A, S>;

struct CallState<A> {
    arguments: Option<A>,
    timer: TimerSlot,
}

/// One scheduled invocation, owned by its timer task.
///
/// It holds no scheduler handle, so a task parked in a scheduler queue never
/// keeps that scheduler alive.
struct PendingCall<A> {
    target: Target<A>,
    gate: Gate,
    state: Mutex<CallState<A>>,
}

impl<A> PendingCall<A> {
    fn fire(&self, ticket: Ticket) {
        let _event = self.gate.lock();
        let arguments = {
            let mut state = self.state.lock();
            if !state.timer.holds(ticket) {
                trace!("ignoring stale delayed invocation");
                return;
            }
            state.timer.release();
            state.arguments.take()
        };

        if let Some(arguments) = arguments {
            (self.target)(arguments);
        }
    }
}

/// Control over one [`PendingCall`].
///
/// Once the call has fired or been cancelled its task is dropped, and with it
/// the only strong reference to the call.
struct CallControl<A, S> {
    scheduler: S,
    call: Weak<PendingCall<A>>,
}

impl<A: Send + 'static, S: Scheduler> Controllable for CallControl<A, S> {
    fn clear(&self) {
        let Some(call) = self.call.upgrade() else {
            return;
        };
        let _event = call.gate.lock();
        let mut state = call.state.lock();
        if state.arguments.take().is_some() {
            debug!("cleared delayed invocation");
        }
        state.timer.disarm(&self.scheduler);
    }

    fn flush(&self) {
        let Some(call) = self.call.upgrade() else {
            return;
        };
        let _event = call.gate.lock();
        let arguments = {
            let mut state = call.state.lock();
            state.timer.disarm(&self.scheduler);
            state.arguments.take()
        };

        if let Some(arguments) = arguments {
            debug!("flushing delayed invocation");
            (call.target)(arguments);
        }
    }

    fn is_pending(&self) -> bool {
        let Some(call) = self.call.upgrade() else {
            return false;
        };
        let pending = call.state.lock().arguments.is_some();
        pending
    }
}

impl<A: Send + 'static, S: Scheduler> Delayed<A, S> {
    /// Schedules an invocation of the target with `arguments`.
    pub fn call(&self, arguments: A) -> InvocationControl {
        let _event = self.gate.lock();
        let pending = Arc::new(PendingCall {
            target: Arc::clone(&self.target),
            gate: Arc::clone(&self.gate),
            state: Mutex::new(CallState {
                arguments: Some(arguments),
                timer: TimerSlot::new(),
            }),
        });

        let id = pending.state.lock().timer.arm(|ticket| {
            let owner = Arc::clone(&pending);
            let task: Task = Box::new(move || owner.fire(ticket));
            match self.wait {
                Wait::Tick => self.scheduler.defer(task),
                Wait::For(wait) => self.scheduler.schedule(wait, task),
            }
        });
        trace!(timer = %id, wait = ?self.wait, "armed delayed invocation");

        InvocationControl::new(Arc::new(CallControl {
            scheduler: self.scheduler.clone(),
            call: Arc::downgrade(&pending),
        }))
    }

    /// Returns the delay applied to each call, or `None` for a deferred
    /// dispatcher.
    #[must_use]
    pub const fn wait(&self) -> Option<Duration> {
        match self.wait {
            Wait::Tick => None,
            Wait::For(wait) => Some(wait),
        }
    }
}

impl<A, S: Clone> Clone for Delayed<A, S> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            target: Arc::clone(&self.target),
            wait: self.wait,
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<A, S> fmt::Debug for Delayed<A, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Delayed")
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

/// Runs the target on the scheduler's soonest tick after each call.
///
/// Every call schedules an independent invocation with its own arguments;
/// two calls in a row produce two invocations.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::scheduler::VirtualScheduler;
/// use lambars_timing::timing::defer;
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let clock = VirtualScheduler::new();
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let log_clone = Arc::clone(&log);
/// let deferred = defer(clock.clone(), move |word: &'static str| {
///     log_clone.lock().unwrap().push(word);
/// });
///
/// let _ = deferred.call("a");
/// let _ = deferred.call("b");
/// assert!(log.lock().unwrap().is_empty());
///
/// clock.advance(Duration::ZERO);
/// assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
/// ```
pub fn defer<A, S, F>(scheduler: S, target: F) -> Deferred<A, S>
where
    A: Send + 'static,
    S: Scheduler,
    F: Fn(A) + Send + Sync + 'static,
{
    Delayed {
        scheduler,
        target: Arc::new(target),
        wait: Wait::Tick,
        gate: Gate::default(),
    }
}

/// Runs the target `wait` after each call.
///
/// Every call schedules an independent invocation with its own arguments.
/// Clearing or flushing one call's control leaves the others untouched.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::scheduler::VirtualScheduler;
/// use lambars_timing::timing::delay;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// let clock = VirtualScheduler::new();
/// let count = Arc::new(AtomicUsize::new(0));
/// let count_clone = Arc::clone(&count);
/// let delayed = delay(
///     clock.clone(),
///     move |()| {
///         count_clone.fetch_add(1, Ordering::SeqCst);
///     },
///     Duration::from_millis(500),
/// );
///
/// let _ = delayed.call(());
/// clock.advance(Duration::from_millis(499));
/// assert_eq!(count.load(Ordering::SeqCst), 0);
/// clock.advance(Duration::from_millis(1));
/// assert_eq!(count.load(Ordering::SeqCst), 1);
/// ```
pub fn delay<A, S, F>(scheduler: S, target: F, wait: Duration) -> Delayed<A, S>
where
    A: Send + 'static,
    S: Scheduler,
    F: Fn(A) + Send + Sync + 'static,
{
    Delayed {
        scheduler,
        target: Arc::new(target),
        wait: Wait::For(wait),
        gate: Gate::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::VirtualScheduler;

    #[test]
    fn fire_after_clear_is_ignored() {
        let clock = VirtualScheduler::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let delayed = delay(
            clock.clone(),
            move |value: i32| seen_clone.lock().push(value),
            Duration::from_millis(10),
        );

        let control = delayed.call(7);
        assert!(control.is_pending());
        control.clear();
        assert!(!control.is_pending());

        clock.advance(Duration::from_millis(10));
        assert!(seen.lock().is_empty());
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn dropping_every_handle_frees_a_queued_invocation() {
        let clock = VirtualScheduler::new();
        let marker = Arc::new(());
        let held = Arc::clone(&marker);
        let delayed = delay(
            clock.clone(),
            move |(): ()| {
                let _ = &held;
            },
            Duration::from_secs(1),
        );

        let _ = delayed.call(());
        assert_eq!(Arc::strong_count(&marker), 2);

        drop(delayed);
        drop(clock);
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[test]
    fn wait_reports_configuration() {
        let clock = VirtualScheduler::new();
        let deferred = defer(clock.clone(), |(): ()| {});
        let delayed = delay(clock, |(): ()| {}, Duration::from_millis(3));

        assert_eq!(deferred.wait(), None);
        assert_eq!(delayed.wait(), Some(Duration::from_millis(3)));
    }
}
