//! Time-based invocation control.
//!
//! This module wraps a target function into a *dispatcher*: a value whose
//! [`call`](Debounced::call) method records a call and decides, with the help
//! of a [`Scheduler`](crate::scheduler::Scheduler), when the target actually
//! runs. Every call returns an [`InvocationControl`] that can cancel
//! ([`clear`](InvocationControl::clear)) or force
//! ([`flush`](InvocationControl::flush)) the pending invocation.
//!
//! # Combinators
//!
//! | Factory            | Runs the target                                   | State shared across calls |
//! |--------------------|---------------------------------------------------|---------------------------|
//! | [`defer`]          | on the next scheduler tick after every call       | no                        |
//! | [`delay`]          | `wait` after every call                           | no                        |
//! | [`debounce`]       | once per burst, after it ends (latest arguments)  | yes                       |
//! | [`debounce_early`] | once per burst, on its first call                 | yes                       |
//! | [`throttle`]       | once per window, when it closes (latest arguments)| yes                       |
//! | [`throttle_early`] | once per window, on its first call                | yes                       |
//!
//! # Arguments
//!
//! Targets take a single argument of type `A`. Use a tuple for several values
//! and `()` for none.
//!
//! # Execution Model
//!
//! A dispatcher's state is guarded by a re-entrant lock held for the whole of
//! each event: a call, a timer firing, a `clear` or a `flush`, including the
//! target invocation itself. Events therefore never overlap, even when a
//! multi-threaded scheduler fires timers on worker threads. Before the target
//! runs, the dispatcher resets its timers, so a target that calls back into
//! its own dispatcher starts a fresh burst or window.
//!
//! `delay` and `defer` share one such lock across all the invocations a
//! dispatcher has scheduled, so their targets never overlap either.
//!
//! Timers do not keep a debounced or throttled dispatcher alive. Dropping
//! every clone of the dispatcher and every control it handed out discards its
//! pending invocation. A delayed invocation is owned by its timer and runs
//! whether or not its control is kept.
//!
//! Panics raised by the target are not caught. From `flush`, or from a leading
//! edge invocation inside `call`, they reach the caller. From a timer they
//! reach whatever drives the scheduler.
//!
//! # Examples
//!
//! ```rust
//! use lambars_timing::scheduler::VirtualScheduler;
//! use lambars_timing::timing::{DebounceOptions, debounce};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! let clock = VirtualScheduler::new();
//! let saves = Arc::new(AtomicUsize::new(0));
//! let saves_clone = Arc::clone(&saves);
//!
//! // Save at most 200ms after typing stops, and never later than 1s after
//! // the first keystroke.
//! let autosave = debounce(
//!     clock.clone(),
//!     move |()| {
//!         saves_clone.fetch_add(1, Ordering::SeqCst);
//!     },
//!     DebounceOptions::new(Duration::from_millis(200)).max_wait(Duration::from_secs(1)),
//! );
//!
//! for _ in 0..20 {
//!     let _ = autosave.call(());
//!     clock.advance(Duration::from_millis(100));
//! }
//!
//! // 2s of continuous typing: the ceiling forced a save every second.
//! assert_eq!(saves.load(Ordering::SeqCst), 2);
//! ```

mod control;
mod debounce;
mod delay;
mod options;
mod slot;
mod throttle;

use std::sync::Arc;

pub use control::InvocationControl;
pub use debounce::{Debounced, DebouncedEarly, debounce, debounce_early};
pub use delay::{Deferred, Delayed, defer, delay};
pub use options::DebounceOptions;
pub use throttle::{Throttled, ThrottledEarly, throttle, throttle_early};

/// The wrapped function, shared between a dispatcher and its timers.
type Target<A> = Arc<dyn Fn(A) + Send + Sync + 'static>;

/// Which end of a burst or window invokes the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Leading,
    Trailing,
}
