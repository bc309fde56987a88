//! Shared helpers for the timing integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lambars_timing::scheduler::VirtualScheduler;

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Installs a test-writer subscriber; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Records every invocation of a target together with the virtual time at
/// which it happened.
pub struct Recorder<A> {
    clock: VirtualScheduler,
    invocations: Arc<Mutex<Vec<(u64, A)>>>,
}

impl<A: Clone + Send + 'static> Recorder<A> {
    pub fn new(clock: &VirtualScheduler) -> Self {
        Self {
            clock: clock.clone(),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn target(&self) -> impl Fn(A) + Send + Sync + 'static {
        let clock = self.clock.clone();
        let invocations = Arc::clone(&self.invocations);
        move |arguments: A| {
            let now = u64::try_from(clock.now().as_millis()).unwrap();
            invocations.lock().unwrap().push((now, arguments));
        }
    }

    pub fn invocations(&self) -> Vec<(u64, A)> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn times(&self) -> Vec<u64> {
        self.invocations().into_iter().map(|(time, _)| time).collect()
    }

    pub fn arguments(&self) -> Vec<A> {
        self.invocations()
            .into_iter()
            .map(|(_, arguments)| arguments)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }
}

/// Advances `clock` to each instant in `call_times` (milliseconds) and calls
/// `call` there with the call's index.
pub fn drive(clock: &VirtualScheduler, call_times: &[u64], mut call: impl FnMut(usize)) {
    for (index, &time) in call_times.iter().enumerate() {
        clock.advance_to(ms(time));
        call(index);
    }
}
