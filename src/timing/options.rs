//! Configuration for the debounce family.

use std::time::Duration;

use crate::TimingError;

/// Timing parameters for [`debounce`](super::debounce) and
/// [`debounce_early`](super::debounce_early).
///
/// - `wait`: the quiet period that ends a burst. Every call restarts it.
/// - `max_wait`: an optional ceiling measured from the *first* call of a
///   burst. It is not restarted by later calls in the same burst, so a steady
///   stream of calls cannot postpone the burst's end past it.
///
/// When `max_wait` is set and `wait >= max_wait`, the quiet-period timer is
/// never armed and the ceiling alone ends each burst.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::timing::DebounceOptions;
/// use std::time::Duration;
///
/// let options = DebounceOptions::new(Duration::from_millis(1500))
///     .max_wait(Duration::from_millis(3500));
/// assert_eq!(options.max_wait, Some(Duration::from_millis(3500)));
///
/// // A negative ceiling means "unbounded".
/// let unbounded = DebounceOptions::from_millis(1500, -1).unwrap();
/// assert_eq!(unbounded.max_wait, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebounceOptions {
    /// Quiet period restarted by every call.
    pub wait: Duration,
    /// Ceiling on a burst, measured from its first call.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_wait: Option<Duration>,
}

impl DebounceOptions {
    /// Creates unbounded options with the given quiet period.
    #[inline]
    #[must_use]
    pub const fn new(wait: Duration) -> Self {
        Self {
            wait,
            max_wait: None,
        }
    }

    /// Sets the ceiling on a burst.
    #[inline]
    #[must_use]
    pub const fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Builds options from millisecond counts.
    ///
    /// A negative `max_wait` leaves the burst unbounded.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::NegativeDuration`] when `wait` is negative.
    pub fn from_millis(wait: i64, max_wait: i64) -> Result<Self, TimingError> {
        let wait =
            u64::try_from(wait).map_err(|_| TimingError::NegativeDuration { millis: wait })?;
        let max_wait = u64::try_from(max_wait).ok().map(Duration::from_millis);
        Ok(Self {
            wait: Duration::from_millis(wait),
            max_wait,
        })
    }

    /// Whether calls restart the quiet-period timer.
    pub(crate) fn restarts_wait(&self) -> bool {
        self.max_wait.is_none_or(|max_wait| self.wait < max_wait)
    }
}

impl From<Duration> for DebounceOptions {
    fn from(wait: Duration) -> Self {
        Self::new(wait)
    }
}
