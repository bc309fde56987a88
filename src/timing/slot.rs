//! Per-dispatcher state cell and timer slots.

use std::cell::RefCell;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::scheduler::{Scheduler, TimerId};

/// Dispatcher state behind a re-entrant lock.
///
/// The lock is held for an entire dispatcher event (call, fire, clear, flush),
/// target invocation included, so events from different threads never
/// interleave. Because the lock is re-entrant, a target may call back into its
/// own dispatcher on the same thread. The `RefCell` borrow must be released
/// before the target runs.
pub(crate) struct Serial<T> {
    cell: ReentrantMutex<RefCell<T>>,
}

impl<T> Serial<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self {
            cell: ReentrantMutex::new(RefCell::new(value)),
        }
    }

    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<T>> {
        self.cell.lock()
    }
}

/// Identifies one arming of a [`TimerSlot`].
///
/// A timer callback carries the ticket it was armed with and only acts if the
/// slot still holds that ticket. A callback that lost a race with `cancel`
/// therefore finds a different ticket (or none) and does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket(u64);

#[derive(Debug, Clone, Copy)]
struct Armed {
    id: TimerId,
    ticket: Ticket,
}

/// Holds at most one live timer.
#[derive(Debug, Default)]
pub(crate) struct TimerSlot {
    armed: Option<Armed>,
    issued: u64,
}

impl TimerSlot {
    pub(crate) const fn new() -> Self {
        Self {
            armed: None,
            issued: 0,
        }
    }

    pub(crate) const fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub(crate) fn holds(&self, ticket: Ticket) -> bool {
        self.armed.is_some_and(|armed| armed.ticket == ticket)
    }

    /// Arms the slot with the timer returned by `schedule`.
    ///
    /// The slot must be empty; callers disarm first when replacing a timer.
    pub(crate) fn arm(&mut self, schedule: impl FnOnce(Ticket) -> TimerId) -> TimerId {
        debug_assert!(self.armed.is_none(), "timer slot armed twice");
        self.issued += 1;
        let ticket = Ticket(self.issued);
        let id = schedule(ticket);
        self.armed = Some(Armed { id, ticket });
        id
    }

    /// Cancels the live timer, if any.
    pub(crate) fn disarm<S: Scheduler>(&mut self, scheduler: &S) {
        if let Some(armed) = self.armed.take() {
            scheduler.cancel(armed.id);
        }
    }

    /// Forgets the live timer without cancelling it; used once it has fired.
    pub(crate) fn release(&mut self) {
        self.armed = None;
    }
}
