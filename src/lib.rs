//! # lambars-timing
//!
//! Higher-order combinators that control *when* and *how often* a function
//! runs.
//!
//! ## Overview
//!
//! - **Time-based control**: [`defer`](timing::defer), [`delay`](timing::delay),
//!   [`debounce`](timing::debounce), [`debounce_early`](timing::debounce_early),
//!   [`throttle`](timing::throttle), [`throttle_early`](timing::throttle_early)
//! - **Count-based control**: [`restrict`](restrict::restrict) and its
//!   `once` / `before` / `after` variants
//! - **Schedulers**: a deterministic [`VirtualScheduler`](scheduler::VirtualScheduler)
//!   and a tokio-backed [`TokioScheduler`](scheduler::TokioScheduler)
//!
//! Every time-based combinator wraps a target function into a dispatcher. Each
//! call to the dispatcher returns an [`InvocationControl`](timing::InvocationControl)
//! that can cancel (`clear`) or force (`flush`) the pending invocation.
//!
//! ## Feature Flags
//!
//! - `timing`: time-based combinators and the virtual scheduler
//! - `restrict`: count-based combinators
//! - `async`: the tokio-backed scheduler
//! - `serde`: `Serialize`/`Deserialize` for configuration types
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use lambars_timing::prelude::*;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::time::Duration;
//!
//! let clock = VirtualScheduler::new();
//! let searches = Arc::new(AtomicUsize::new(0));
//! let searches_clone = Arc::clone(&searches);
//! let search = debounce(
//!     clock.clone(),
//!     move |_query: String| {
//!         searches_clone.fetch_add(1, Ordering::SeqCst);
//!     },
//!     Duration::from_millis(300),
//! );
//!
//! let _ = search.call("ru".to_string());
//! let _ = search.call("rus".to_string());
//! let control = search.call("rust".to_string());
//!
//! control.flush();
//! assert_eq!(searches.load(Ordering::SeqCst), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and functions.
///
/// # Usage
///
/// ```rust
/// use lambars_timing::prelude::*;
/// ```
pub mod prelude {
    pub use crate::TimingError;

    #[cfg(feature = "timing")]
    pub use crate::scheduler::*;

    #[cfg(feature = "timing")]
    pub use crate::timing::*;

    #[cfg(feature = "restrict")]
    pub use crate::restrict::*;
}

mod error;

#[cfg(feature = "timing")]
pub mod scheduler;

#[cfg(feature = "timing")]
pub mod timing;

#[cfg(feature = "restrict")]
pub mod restrict;

pub use error::TimingError;
