//! Throttled invocation.
//!
//! A throttled dispatcher runs its target at most once per window of `wait`.
//! The first call made while no window is open opens one.
//!
//! - [`throttle`] runs the target when the window closes, with the latest
//!   arguments seen during the window (trailing edge).
//! - [`throttle_early`] runs the target immediately on the call that opens the
//!   window and drops every other call made during it (leading edge).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use super::control::{Controllable, InvocationControl};
use super::slot::{Serial, Ticket, TimerSlot};
use super::{Edge, Target};
use crate::scheduler::Scheduler;

struct ThrottleState<A> {
    arguments: Option<A>,
    window: TimerSlot,
}

struct ThrottleCore<A, S> {
    scheduler: S,
    target: Target<A>,
    wait: Duration,
    edge: Edge,
    state: Serial<ThrottleState<A>>,
}

impl<A: Send + 'static, S: Scheduler> ThrottleCore<A, S> {
    fn new(scheduler: S, target: Target<A>, wait: Duration, edge: Edge) -> Arc<Self> {
        Arc::new(Self {
            scheduler,
            target,
            wait,
            edge,
            state: Serial::new(ThrottleState {
                arguments: None,
                window: TimerSlot::new(),
            }),
        })
    }

    fn call(self: &Arc<Self>, arguments: A) {
        let guard = self.state.lock();
        let leading = {
            let mut state = guard.borrow_mut();
            let opens_window = !state.window.is_armed();
            if opens_window {
                let id = state.window.arm(|ticket| {
                    let core = Arc::downgrade(self);
                    self.scheduler.schedule(
                        self.wait,
                        Box::new(move || {
                            if let Some(core) = core.upgrade() {
                                core.fire(ticket);
                            }
                        }),
                    )
                });
                trace!(timer = %id, wait = ?self.wait, "opened throttle window");
            }

            match self.edge {
                Edge::Trailing => {
                    state.arguments = Some(arguments);
                    None
                }
                Edge::Leading if opens_window => Some(arguments),
                Edge::Leading => {
                    trace!("dropped call inside throttle window");
                    None
                }
            }
        };

        if let Some(arguments) = leading {
            (self.target)(arguments);
        }
    }

    fn fire(&self, ticket: Ticket) {
        let guard = self.state.lock();
        let arguments = {
            let mut state = guard.borrow_mut();
            if !state.window.holds(ticket) {
                trace!("ignoring stale throttle timer");
                return;
            }
            state.window.release();
            state.arguments.take()
        };

        trace!("throttle window closed");
        if let Some(arguments) = arguments {
            (self.target)(arguments);
        }
    }
}

impl<A: Send + 'static, S: Scheduler> Controllable for ThrottleCore<A, S> {
    fn clear(&self) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state.window.is_armed() {
            debug!("cleared throttled dispatcher");
        }
        state.window.disarm(&self.scheduler);
        state.arguments = None;
    }

    fn flush(&self) {
        let guard = self.state.lock();
        let arguments = {
            let mut state = guard.borrow_mut();
            state.window.disarm(&self.scheduler);
            state.arguments.take()
        };

        if let Some(arguments) = arguments {
            debug!("flushing throttled dispatcher");
            (self.target)(arguments);
        }
    }

    fn is_pending(&self) -> bool {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.window.is_armed() || state.arguments.is_some()
    }
}

macro_rules! throttled_dispatcher {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<A, S> {
            core: Arc<ThrottleCore<A, S>>,
        }

        impl<A: Send + 'static, S: Scheduler> $name<A, S> {
            /// Records a call with `arguments` and returns control over the
            /// current window.
            pub fn call(&self, arguments: A) -> InvocationControl {
                self.core.call(arguments);
                self.control()
            }

            /// Returns control over the current window without making a call.
            #[must_use]
            pub fn control(&self) -> InvocationControl {
                InvocationControl::new(Arc::clone(&self.core) as Arc<dyn Controllable>)
            }

            /// Returns the window length.
            #[must_use]
            pub fn wait(&self) -> Duration {
                self.core.wait
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
                    .field("wait", &self.core.wait)
                    .finish_non_exhaustive()
            }
        }
    };
}

throttled_dispatcher! {
    /// Dispatcher returned by [`throttle`].
    Throttled
}

throttled_dispatcher! {
    /// Dispatcher returned by [`throttle_early`].
    ThrottledEarly
}

/// Invokes the target at most once per `wait`, at the end of each window.
///
/// Calls made while a window is open replace the pending arguments; only the
/// latest arguments reach the target.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::scheduler::VirtualScheduler;
/// use lambars_timing::timing::throttle;
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let clock = VirtualScheduler::new();
/// let positions = Arc::new(Mutex::new(Vec::new()));
/// let positions_clone = Arc::clone(&positions);
/// let track = throttle(
///     clock.clone(),
///     move |position: (i32, i32)| positions_clone.lock().unwrap().push(position),
///     Duration::from_millis(100),
/// );
///
/// let _ = track.call((0, 0));
/// let _ = track.call((3, 4));
/// clock.advance(Duration::from_millis(100));
///
/// assert_eq!(*positions.lock().unwrap(), vec![(3, 4)]);
/// ```
pub fn throttle<A, S, F>(scheduler: S, target: F, wait: Duration) -> Throttled<A, S>
where
    A: Send + 'static,
    S: Scheduler,
    F: Fn(A) + Send + Sync + 'static,
{
    Throttled {
        core: ThrottleCore::new(scheduler, Arc::new(target), wait, Edge::Trailing),
    }
}

/// Invokes the target immediately on the first call of each `wait` window.
///
/// Calls made while the window is open are dropped; their arguments never
/// reach the target. [`InvocationControl::flush`] behaves like
/// [`InvocationControl::clear`]: both close the window at once.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::scheduler::VirtualScheduler;
/// use lambars_timing::timing::throttle_early;
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let clock = VirtualScheduler::new();
/// let fired = Arc::new(Mutex::new(Vec::new()));
/// let fired_clone = Arc::clone(&fired);
/// let shoot = throttle_early(
///     clock.clone(),
///     move |shot: u32| fired_clone.lock().unwrap().push(shot),
///     Duration::from_millis(100),
/// );
///
/// let _ = shoot.call(1);
/// let _ = shoot.call(2);
/// clock.advance(Duration::from_millis(100));
/// let _ = shoot.call(3);
///
/// assert_eq!(*fired.lock().unwrap(), vec![1, 3]);
/// ```
pub fn throttle_early<A, S, F>(scheduler: S, target: F, wait: Duration) -> ThrottledEarly<A, S>
where
    A: Send + 'static,
    S: Scheduler,
    F: Fn(A) + Send + Sync + 'static,
{
    ThrottledEarly {
        core: ThrottleCore::new(scheduler, Arc::new(target), wait, Edge::Leading),
    }
}
