//! Debounced invocation.
//!
//! A debounced dispatcher coalesces a burst of calls into one invocation of
//! its target. Two timers drive it:
//!
//! - the *wait* timer, restarted by every call, ends a burst after a quiet
//!   period;
//! - the optional *ceiling* timer, armed by the first call of a burst and never
//!   restarted, caps how long a burst may last.
//!
//! Whichever timer fires first ends the burst and disarms the other.
//! [`debounce`] invokes the target at the end of the burst with the latest
//! arguments (trailing edge); [`debounce_early`] invokes it at the start of the
//! burst with the first call's arguments (leading edge).

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::control::{Controllable, InvocationControl};
use super::options::DebounceOptions;
use super::slot::{Serial, Ticket, TimerSlot};
use super::{Edge, Target};
use crate::scheduler::{Scheduler, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Wait,
    Ceiling,
}

struct DebounceState<A> {
    arguments: Option<A>,
    wait: TimerSlot,
    ceiling: TimerSlot,
}

impl<A> DebounceState<A> {
    const fn slot(&self, slot: Slot) -> &TimerSlot {
        match slot {
            Slot::Wait => &self.wait,
            Slot::Ceiling => &self.ceiling,
        }
    }

    const fn is_idle(&self) -> bool {
        !self.wait.is_armed() && !self.ceiling.is_armed()
    }

    fn reset<S: Scheduler>(&mut self, scheduler: &S) -> Option<A> {
        self.wait.disarm(scheduler);
        self.ceiling.disarm(scheduler);
        self.arguments.take()
    }
}

struct DebounceCore<A, S> {
    scheduler: S,
    target: Target<A>,
    options: DebounceOptions,
    edge: Edge,
    state: Serial<DebounceState<A>>,
}

impl<A: Send + 'static, S: Scheduler> DebounceCore<A, S> {
    fn new(scheduler: S, target: Target<A>, options: DebounceOptions, edge: Edge) -> Arc<Self> {
        Arc::new(Self {
            scheduler,
            target,
            options,
            edge,
            state: Serial::new(DebounceState {
                arguments: None,
                wait: TimerSlot::new(),
                ceiling: TimerSlot::new(),
            }),
        })
    }

    /// The task holds the core weakly: a dispatcher whose every clone and
    /// control is dropped is freed, and its queued timers fire as no-ops.
    fn timer_task(self: &Arc<Self>, slot: Slot, ticket: Ticket) -> Task {
        let core = Arc::downgrade(self);
        Box::new(move || {
            if let Some(core) = core.upgrade() {
                core.fire(slot, ticket);
            }
        })
    }

    fn call(self: &Arc<Self>, arguments: A) {
        let guard = self.state.lock();
        let leading = {
            let mut state = guard.borrow_mut();
            let leading = match self.edge {
                Edge::Trailing => {
                    state.arguments = Some(arguments);
                    None
                }
                Edge::Leading => state.is_idle().then_some(arguments),
            };

            if let Some(max_wait) = self.options.max_wait {
                if !state.ceiling.is_armed() {
                    let id = state.ceiling.arm(|ticket| {
                        self.scheduler
                            .schedule(max_wait, self.timer_task(Slot::Ceiling, ticket))
                    });
                    trace!(timer = %id, ?max_wait, "armed debounce ceiling");
                }
            }

            if self.options.restarts_wait() {
                state.wait.disarm(&self.scheduler);
                let wait = self.options.wait;
                let id = state.wait.arm(|ticket| {
                    self.scheduler
                        .schedule(wait, self.timer_task(Slot::Wait, ticket))
                });
                trace!(timer = %id, ?wait, "armed debounce wait");
            }

            leading
        };

        // Timers are armed before a leading invocation so that a target
        // calling back into this dispatcher finds it busy.
        if let Some(arguments) = leading {
            trace!("invoking debounced target on leading edge");
            (self.target)(arguments);
        }
    }

    fn fire(&self, slot: Slot, ticket: Ticket) {
        let guard = self.state.lock();
        let arguments = {
            let mut state = guard.borrow_mut();
            if !state.slot(slot).holds(ticket) {
                trace!(?slot, "ignoring stale debounce timer");
                return;
            }
            match slot {
                Slot::Wait => state.wait.release(),
                Slot::Ceiling => state.ceiling.release(),
            }
            state.reset(&self.scheduler)
        };

        trace!(?slot, "debounce burst ended");
        if let Some(arguments) = arguments {
            (self.target)(arguments);
        }
    }
}

impl<A: Send + 'static, S: Scheduler> Controllable for DebounceCore<A, S> {
    fn clear(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if !state.is_idle() {
            debug!("cleared debounced dispatcher");
        }
        drop(state.reset(&self.scheduler));
    }

    fn flush(&self) {
        let guard = self.state.lock();
        let arguments = guard.borrow_mut().reset(&self.scheduler);
        if let Some(arguments) = arguments {
            debug!("flushing debounced dispatcher");
            (self.target)(arguments);
        }
    }

    fn is_pending(&self) -> bool {
        let guard = self.state.lock();
        let state = guard.borrow();
        !state.is_idle() || state.arguments.is_some()
    }
}

macro_rules! debounced_dispatcher {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<A, S> {
            core: Arc<DebounceCore<A, S>>,
        }

        impl<A: Send + 'static, S: Scheduler> $name<A, S> {
            /// Records a call with `arguments` and returns control over the
            /// dispatcher's pending state.
            pub fn call(&self, arguments: A) -> InvocationControl {
                self.core.call(arguments);
                self.control()
            }

            /// Returns control over the dispatcher's pending state without
            /// making a call.
            #[must_use]
            pub fn control(&self) -> InvocationControl {
                InvocationControl::new(Arc::clone(&self.core) as Arc<dyn Controllable>)
            }

            /// Returns the timing parameters.
            #[must_use]
            pub fn options(&self) -> DebounceOptions {
                self.core.options
            }
        }

        impl<A, S> Clone for $name<A, S> {
            fn clone(&self) -> Self {
                Self {
                    core: Arc::clone(&self.core),
                }
            }
        }

        impl<A, S> fmt::Debug for $name<A, S> {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter
                    .debug_struct(stringify!($name))
                    .field("options", &self.core.options)
                    .finish_non_exhaustive()
            }
        }
    };
}

debounced_dispatcher! {
    /// Dispatcher returned by [`debounce`].
    ///
    /// Clones share state: a call through any clone extends the same burst.
    Debounced
}

debounced_dispatcher! {
    /// Dispatcher returned by [`debounce_early`].
    ///
    /// Clones share state: a call through any clone extends the same burst.
    DebouncedEarly
}

/// Invokes the target once per burst of calls, after the burst ends.
///
/// Each call replaces the pending arguments and restarts the quiet period
/// `options.wait`. The target runs with the latest arguments once the quiet
/// period elapses, or once `options.max_wait` has passed since the burst's
/// first call, whichever comes first.
///
/// `options` accepts a bare [`Duration`](std::time::Duration) for an unbounded
/// debounce.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::scheduler::VirtualScheduler;
/// use lambars_timing::timing::debounce;
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let clock = VirtualScheduler::new();
/// let saved = Arc::new(Mutex::new(Vec::new()));
/// let saved_clone = Arc::clone(&saved);
/// let save = debounce(
///     clock.clone(),
///     move |text: String| saved_clone.lock().unwrap().push(text),
///     Duration::from_millis(300),
/// );
///
/// for text in ["h", "he", "hel", "hello"] {
///     let _ = save.call(text.to_string());
///     clock.advance(Duration::from_millis(100));
/// }
/// clock.advance(Duration::from_millis(300));
///
/// assert_eq!(*saved.lock().unwrap(), vec!["hello".to_string()]);
/// ```
pub fn debounce<A, S, F>(
    scheduler: S,
    target: F,
    options: impl Into<DebounceOptions>,
) -> Debounced<A, S>
where
    A: Send + 'static,
    S: Scheduler,
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced {
        core: DebounceCore::new(scheduler, Arc::new(target), options.into(), Edge::Trailing),
    }
}

/// Invokes the target on the first call of each burst.
///
/// A call made while the dispatcher is idle runs the target synchronously with
/// that call's arguments and starts a burst. Calls made during the burst are
/// absorbed but still restart the quiet period. The burst ends, and the
/// dispatcher becomes idle again, under the same rules as [`debounce`]; ending
/// a burst never invokes the target.
///
/// Because nothing is ever left pending, [`InvocationControl::flush`] behaves
/// like [`InvocationControl::clear`]: both end the current burst at once.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::scheduler::VirtualScheduler;
/// use lambars_timing::timing::debounce_early;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// let clock = VirtualScheduler::new();
/// let clicks = Arc::new(AtomicUsize::new(0));
/// let clicks_clone = Arc::clone(&clicks);
/// let click = debounce_early(
///     clock.clone(),
///     move |()| {
///         clicks_clone.fetch_add(1, Ordering::SeqCst);
///     },
///     Duration::from_millis(250),
/// );
///
/// let _ = click.call(());
/// let _ = click.call(());
/// assert_eq!(clicks.load(Ordering::SeqCst), 1);
///
/// clock.advance(Duration::from_millis(250));
/// let _ = click.call(());
/// assert_eq!(clicks.load(Ordering::SeqCst), 2);
/// ```
pub fn debounce_early<A, S, F>(
    scheduler: S,
    target: F,
    options: impl Into<DebounceOptions>,
) -> DebouncedEarly<A, S>
where
    A: Send + 'static,
    S: Scheduler,
    F: Fn(A) + Send + Sync + 'static,
{
    DebouncedEarly {
        core: DebounceCore::new(scheduler, Arc::new(target), options.into(), Edge::Leading),
    }
}
