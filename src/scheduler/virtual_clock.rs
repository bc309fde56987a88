//! Deterministic, manually advanced scheduler.
//!
//! [`VirtualScheduler`] keeps its own notion of "now", starting at zero. Time
//! never moves on its own: tests move it with [`advance`](VirtualScheduler::advance),
//! [`advance_to`](VirtualScheduler::advance_to) or
//! [`run_until_idle`](VirtualScheduler::run_until_idle), and every task that
//! falls due along the way runs on the calling thread.
//!
//! # Ordering
//!
//! Due tasks run in order of deadline, and tasks sharing a deadline run in the
//! order they were scheduled. While a task runs, [`now`](VirtualScheduler::now)
//! reports that task's deadline, so callbacks observe the instant they were
//! scheduled for. A task that schedules another task due before the advance
//! target will see that task run within the same advance.
//!
//! No internal lock is held while a task runs; tasks are free to schedule and
//! cancel on the same scheduler.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use super::{Scheduler, Task, TimerId, TimerIdSource};

/// Queue position: deadline first, then scheduling order.
type QueueKey = (Duration, u64);

struct ClockState {
    now: Duration,
    sequence: u64,
    queue: BTreeMap<QueueKey, (TimerId, Task)>,
    positions: HashMap<TimerId, QueueKey>,
}

struct Shared {
    ids: TimerIdSource,
    state: Mutex<ClockState>,
}

/// A scheduler driven by a virtual clock.
///
/// Cloning yields another handle to the same clock and queue.
///
/// # Examples
///
/// ```rust
/// use lambars_timing::scheduler::{Scheduler, VirtualScheduler};
/// use std::time::Duration;
///
/// let clock = VirtualScheduler::new();
/// let id = clock.schedule(Duration::from_secs(1), Box::new(|| {}));
/// assert_eq!(clock.pending(), 1);
///
/// clock.cancel(id);
/// assert_eq!(clock.pending(), 0);
///
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now(), Duration::from_secs(5));
/// ```
#[derive(Clone)]
pub struct VirtualScheduler {
    shared: Arc<Shared>,
}

impl VirtualScheduler {
    /// Creates a scheduler whose clock reads zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                ids: TimerIdSource::new(),
                state: Mutex::new(ClockState {
                    now: Duration::ZERO,
                    sequence: 0,
                    queue: BTreeMap::new(),
                    positions: HashMap::new(),
                }),
            }),
        }
    }

    /// Returns the virtual time elapsed since the scheduler was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.shared.state.lock().now
    }

    /// Returns the number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Returns the deadline of the earliest waiting task, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.shared
            .state
            .lock()
            .queue
            .first_key_value()
            .map(|(&(deadline, _), _)| deadline)
    }

    /// Moves the clock forward by `duration`, running every task that falls due.
    pub fn advance(&self, duration: Duration) {
        let target = self.now().saturating_add(duration);
        self.advance_to(target);
    }

    /// Moves the clock to `instant`, running every task due at or before it.
    ///
    /// The clock never moves backwards: an `instant` earlier than
    /// [`now`](Self::now) only runs tasks that are already overdue.
    ///
    /// # Panics
    ///
    /// A panic raised by a task propagates to the caller. The panicking task
    /// has already been removed from the queue, and the clock stays at its
    /// deadline.
    pub fn advance_to(&self, instant: Duration) {
        while let Some((id, task)) = self.pop_due(Some(instant)) {
            trace!(timer = %id, "running virtual timer");
            task();
        }

        let mut state = self.shared.state.lock();
        if state.now < instant {
            state.now = instant;
        }
    }

    /// Runs tasks in deadline order until the queue is empty.
    ///
    /// The clock ends at the deadline of the last task run. Tasks that keep
    /// rescheduling themselves make this loop forever.
    pub fn run_until_idle(&self) {
        while let Some((id, task)) = self.pop_due(None) {
            trace!(timer = %id, "running virtual timer");
            task();
        }
    }

    fn pop_due(&self, limit: Option<Duration>) -> Option<(TimerId, Task)> {
        let mut state = self.shared.state.lock();
        let (&key, _) = state.queue.first_key_value()?;
        let (deadline, _) = key;
        if limit.is_some_and(|limit| deadline > limit) {
            return None;
        }

        let (id, task) = state.queue.remove(&key)?;
        state.positions.remove(&id);
        if state.now < deadline {
            state.now = deadline;
        }
        Some((id, task))
    }
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VirtualScheduler {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        formatter
            .debug_struct("VirtualScheduler")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerId {
        let id = self.shared.ids.next_id();
        let mut state = self.shared.state.lock();
        let key = (state.now.saturating_add(delay), state.sequence);
        state.sequence += 1;
        state.queue.insert(key, (id, task));
        state.positions.insert(id, key);
        trace!(timer = %id, deadline = ?key.0, "scheduled virtual timer");
        id
    }

    fn cancel(&self, id: TimerId) {
        // The removed task, and whatever it captured, is dropped after the
        // lock is released.
        let removed = {
            let mut state = self.shared.state.lock();
            let key = state.positions.remove(&id);
            key.and_then(|key| state.queue.remove(&key))
        };
        if removed.is_some() {
            trace!(timer = %id, "cancelled virtual timer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn tasks_sharing_a_deadline_run_in_scheduling_order() {
        let clock = VirtualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            clock.schedule(ms(10), Box::new(move || order.lock().push(label)));
        }

        clock.advance(ms(10));
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn now_reports_the_deadline_while_a_task_runs() {
        let clock = VirtualScheduler::new();
        let observed = Arc::new(Mutex::new(None));
        let observed_clone = Arc::clone(&observed);
        let clock_clone = clock.clone();

        clock.schedule(
            ms(30),
            Box::new(move || *observed_clone.lock() = Some(clock_clone.now())),
        );
        clock.advance(ms(100));

        assert_eq!(*observed.lock(), Some(ms(30)));
        assert_eq!(clock.now(), ms(100));
    }

    #[test]
    fn tasks_scheduled_by_tasks_run_within_the_same_advance() {
        let clock = VirtualScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let clock_clone = clock.clone();

        clock.schedule(
            ms(10),
            Box::new(move || {
                let count = Arc::clone(&count_clone);
                clock_clone.schedule(
                    ms(10),
                    Box::new(move || {
                        count.fetch_add(1, Ordering::SeqCst);
                    }),
                );
            }),
        );

        clock.advance(ms(20));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn cancel_is_idempotent() {
        let clock = VirtualScheduler::new();
        let id = clock.schedule(ms(5), Box::new(|| {}));

        clock.cancel(id);
        clock.cancel(id);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn advance_to_never_moves_backwards() {
        let clock = VirtualScheduler::new();
        clock.advance(ms(50));
        clock.advance_to(ms(10));
        assert_eq!(clock.now(), ms(50));
    }

    #[test]
    fn run_until_idle_stops_at_last_deadline() {
        let clock = VirtualScheduler::new();
        clock.schedule(ms(70), Box::new(|| {}));
        clock.schedule(ms(20), Box::new(|| {}));

        assert_eq!(clock.next_deadline(), Some(ms(20)));
        clock.run_until_idle();
        assert_eq!(clock.now(), ms(70));
        assert_eq!(clock.next_deadline(), None);
    }
}
