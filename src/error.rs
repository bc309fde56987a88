//! Error types for the crate.
//!
//! Failures of the wrapped target functions are not represented here: targets
//! report failure by panicking, and no combinator catches those panics.

use thiserror::Error;

/// Errors raised while configuring timing combinators or their schedulers.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::TimingError;
///
/// let error = TimingError::NegativeDuration { millis: -20 };
/// assert_eq!(format!("{error}"), "duration must not be negative (got -20 ms)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimingError {
    /// A tokio-backed scheduler was requested outside a tokio runtime.
    #[error("no tokio runtime is running on the current thread")]
    NoRuntime,

    /// A duration was given as a negative number of milliseconds.
    #[error("duration must not be negative (got {millis} ms)")]
    NegativeDuration {
        /// The rejected value.
        millis: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_runtime_display() {
        assert_eq!(
            format!("{}", TimingError::NoRuntime),
            "no tokio runtime is running on the current thread"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
        assert_error(&TimingError::NoRuntime);
    }
}
