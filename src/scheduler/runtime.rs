//! Scheduler backed by a tokio runtime.
//!
//! Each scheduled task becomes a spawned tokio task that sleeps for the
//! requested delay and then runs the callback. Cancellation aborts the
//! sleeping task.
//!
//! A callback that panics takes its tokio task down with it; tokio reports
//! the panic through the task's join handle, which this scheduler does not
//! observe. That is the scheduling boundary at which timer-driven failures
//! surface.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

use super::{Scheduler, Task, TimerId, TimerIdSource};
use crate::TimingError;

struct Shared {
    handle: Handle,
    ids: TimerIdSource,
    sleeping: Mutex<HashMap<TimerId, AbortHandle>>,
}

/// A scheduler that runs tasks on a tokio runtime.
///
/// Works with both current-thread and multi-thread runtimes, and honours
/// paused time (`tokio::time::pause`), which makes it usable in
/// `#[tokio::test(start_paused = true)]` tests.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::scheduler::{Scheduler, TokioScheduler};
/// use std::time::Duration;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let scheduler = TokioScheduler::current().unwrap();
///     let (sender, receiver) = tokio::sync::oneshot::channel();
///
///     scheduler.schedule(
///         Duration::from_millis(5),
///         Box::new(move || {
///             let _ = sender.send("fired");
///         }),
///     );
///
///     assert_eq!(receiver.await.unwrap(), "fired");
/// }
/// ```
#[derive(Clone)]
pub struct TokioScheduler {
    shared: Arc<Shared>,
}

impl TokioScheduler {
    /// Creates a scheduler on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::NoRuntime`] when called outside a tokio runtime.
    pub fn current() -> Result<Self, TimingError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|_| TimingError::NoRuntime)
    }

    /// Creates a scheduler that spawns onto the given runtime handle.
    #[must_use]
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                handle,
                ids: TimerIdSource::new(),
                sleeping: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the number of tasks still sleeping.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.sleeping.lock().len()
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TokioScheduler")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let id = self.shared.ids.next_id();
        let shared = Arc::clone(&self.shared);

        // The map lock is held across the spawn so the task cannot finish and
        // remove its entry before the entry exists.
        let mut sleeping = self.shared.sleeping.lock();
        let join = self.shared.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if shared.sleeping.lock().remove(&id).is_none() {
                return;
            }
            trace!(timer = %id, "running tokio timer");
            task();
        });
        sleeping.insert(id, join.abort_handle());
        drop(sleeping);

        trace!(timer = %id, ?delay, "scheduled tokio timer");
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some(abort) = self.shared.sleeping.lock().remove(&id) {
            abort.abort();
            trace!(timer = %id, "cancelled tokio timer");
        }
    }
}
