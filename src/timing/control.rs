//! The handle returned by every dispatcher call.

use std::fmt;
use std::sync::Arc;

/// Something an [`InvocationControl`] can govern.
pub(crate) trait Controllable: Send + Sync {
    /// Cancels outstanding timers without invoking the target.
    fn clear(&self);

    /// Invokes the target now with whatever is pending, then cancels.
    fn flush(&self);

    /// Returns `true` while a timer or pending invocation is outstanding.
    fn is_pending(&self) -> bool;
}

/// Control over the pending invocation produced by a dispatcher call.
///
/// For [`delay`](super::delay) and [`defer`](super::defer) the handle governs
/// only the invocation scheduled by that one call. For the debounce and
/// throttle families every handle governs the dispatcher's shared state, so a
/// handle from an earlier call can still flush arguments supplied later.
///
/// Both operations are idempotent: once nothing is pending, further calls to
/// [`clear`](Self::clear) or [`flush`](Self::flush) do nothing.
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
/// let total = Arc::new(AtomicUsize::new(0));
/// let total_clone = Arc::clone(&total);
/// let delayed = delay(
///     clock.clone(),
///     move |amount: usize| {
///         total_clone.fetch_add(amount, Ordering::SeqCst);
///     },
///     Duration::from_millis(100),
/// );
///
/// let control = delayed.call(5);
/// control.flush();
/// assert_eq!(total.load(Ordering::SeqCst), 5);
///
/// // The timer was cancelled by the flush, and a second flush is a no-op.
/// control.flush();
/// clock.advance(Duration::from_millis(100));
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
#[derive(Clone)]
pub struct InvocationControl {
    governed: Arc<dyn Controllable>,
}

impl InvocationControl {
    pub(crate) fn new(governed: Arc<dyn Controllable>) -> Self {
        Self { governed }
    }

    /// Cancels the pending invocation without running the target.
    #[inline]
    pub fn clear(&self) {
        self.governed.clear();
    }

    /// Runs the target immediately with the pending arguments and cancels the
    /// timer.
    ///
    /// # Panics
    ///
    /// A panic raised by the target propagates to the caller. The dispatcher
    /// has already been reset by then and stays usable.
    #[inline]
    pub fn flush(&self) {
        self.governed.flush();
    }

    /// Returns `true` while an invocation or rate-limit window is outstanding.
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.governed.is_pending()
    }
}

impl fmt::Debug for InvocationControl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("InvocationControl")
            .field("pending", &self.is_pending())
            .finish()
    }
}
