//! Count-based invocation control.
//!
//! These combinators decide whether to run the target from the number of calls
//! seen so far, not from the clock:
//!
//! - [`restrict`]: run only for calls whose zero-based index lies in a window
//! - [`restrict_once`]: run only for the first call
//! - [`restrict_before`]: run only for the first `n` calls
//! - [`restrict_after`]: skip the first `n` calls, then always run
//!
//! Each returns a [`Restricted`] wrapper whose [`call`](Restricted::call)
//! yields `Some(result)` when the target ran and `None` when the call was
//! skipped.
//!
//! # Examples
//!
//! ```rust
//! use lambars_timing::restrict::restrict;
//!
//! let add_one = restrict(|value: i32| value + 1, 1, Some(3));
//!
//! assert_eq!(add_one.call(10), None);     // index 0
//! assert_eq!(add_one.call(10), Some(11)); // index 1
//! assert_eq!(add_one.call(10), Some(11)); // index 2
//! assert_eq!(add_one.call(10), None);     // index 3
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A function that only runs for some of its calls.
///
/// The call counter is atomic, so a `Restricted` can be shared between threads
/// when its target can.
pub struct Restricted<F> {
    target: F,
    start: usize,
    end: Option<usize>,
    calls: AtomicUsize,
}

impl<F> Restricted<F> {
    /// Records a call and runs the target if the call's index is admitted.
    pub fn call<A, R>(&self, arguments: A) -> Option<R>
    where
        F: Fn(A) -> R,
    {
        let index = self.calls.fetch_add(1, Ordering::Relaxed);
        self.admits(index).then(|| (self.target)(arguments))
    }

    /// Returns the number of calls recorded so far, admitted or not.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Returns `true` if the call with the given zero-based index runs the
    /// target.
    #[must_use]
    pub fn admits(&self, index: usize) -> bool {
        let before_start = index < self.start;
        let before_end = match self.end {
            Some(end) => index < end,
            None => true,
        };
        before_start != before_end
    }
}

impl<F> fmt::Debug for Restricted<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Restricted")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

/// Runs `target` only for calls whose zero-based index lies in `[start, end)`.
///
/// `end = None` leaves the window open-ended. When `end` is below `start` the
/// window is `[end, start)` instead.
pub const fn restrict<F>(target: F, start: usize, end: Option<usize>) -> Restricted<F> {
    Restricted {
        target,
        start,
        end,
        calls: AtomicUsize::new(0),
    }
}

/// Runs `target` for the first call only.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::restrict::restrict_once;
///
/// let init = restrict_once(|()| "initialised");
/// assert_eq!(init.call(()), Some("initialised"));
/// assert_eq!(init.call(()), None);
/// ```
pub const fn restrict_once<F>(target: F) -> Restricted<F> {
    restrict(target, 0, Some(1))
}

/// Runs `target` for the first `count` calls.
pub const fn restrict_before<F>(target: F, count: usize) -> Restricted<F> {
    restrict(target, 0, Some(count))
}

/// Skips the first `count` calls, then runs `target` on every call.
pub const fn restrict_after<F>(target: F, count: usize) -> Restricted<F> {
    restrict(target, count, None)
}
