#![cfg(feature = "timing")]

mod common;

use common::{Recorder, drive, ms};
use lambars_timing::scheduler::VirtualScheduler;
use lambars_timing::timing::{throttle, throttle_early};
use rstest::rstest;

// =============================================================================
// Trailing Edge
// =============================================================================

#[rstest]
#[case::single_window(&[0, 1000, 2000], &[2500])]
#[case::two_windows(&[0, 1000, 2000, 3000, 4000], &[2500, 5500])]
fn throttle_invocation_schedule(#[case] call_times: &[u64], #[case] expected: &[u64]) {
    let clock = VirtualScheduler::new();
    let recorder = Recorder::new(&clock);
    let throttled = throttle(clock.clone(), recorder.target(), ms(2500));

    drive(&clock, call_times, |_| {
        let _ = throttled.call(());
    });
    clock.advance_to(ms(10_000));

    assert_eq!(recorder.times(), expected);
}

#[rstest]
fn throttle_passes_latest_arguments_of_window() {
    let clock = VirtualScheduler::new();
    let recorder = Recorder::new(&clock);
    let throttled = throttle(clock.clone(), recorder.target(), ms(2500));

    drive(&clock, &[0, 1000, 2000, 3000, 4000], |index| {
        let _ = throttled.call(index);
    });
    clock.run_until_idle();

    assert_eq!(recorder.invocations(), vec![(2500, 2), (5500, 4)]);
}

#[rstest]
fn throttle_window_is_not_extended_by_calls() {
    let clock = VirtualScheduler::new();
    let recorder = Recorder::new(&clock);
    let throttled = throttle(clock.clone(), recorder.target(), ms(100));

    drive(&clock, &[0, 10, 20, 30, 40, 50, 60, 70, 80, 90], |index| {
        let _ = throttled.call(index);
    });
    clock.run_until_idle();

    assert_eq!(recorder.invocations(), vec![(100, 9)]);
}

#[rstest]
fn throttle_clear_discards_pending_arguments() {
    let clock = VirtualScheduler::new();
    let recorder = Recorder::new(&clock);
    let throttled = throttle(clock.clone(), recorder.target(), ms(100));

    let _ = throttled.call("dropped");
    throttled.control().clear();
    assert!(!throttled.control().is_pending());

    clock.advance(ms(50));
    let _ = throttled.call("kept");
    clock.run_until_idle();

    assert_eq!(recorder.invocations(), vec![(150, "kept")]);
}

// =============================================================================
// Leading Edge
// =============================================================================

#[rstest]
#[case::single_window(&[0, 1000, 2000], &[0])]
#[case::two_windows(&[0, 1000, 2000, 3000, 4000], &[0, 3000])]
#[case::boundary_call_opens_new_window(&[0, 2500, 4999, 5000], &[0, 2500, 5000])]
fn throttle_early_invocation_schedule(#[case] call_times: &[u64], #[case] expected: &[u64]) {
    let clock = VirtualScheduler::new();
    let recorder = Recorder::new(&clock);
    let throttled = throttle_early(clock.clone(), recorder.target(), ms(2500));

    drive(&clock, call_times, |_| {
        let _ = throttled.call(());
    });
    clock.advance_to(ms(10_000));

    assert_eq!(recorder.times(), expected);
}

#[rstest]
fn throttle_early_drops_calls_inside_window() {
    let clock = VirtualScheduler::new();
    let recorder = Recorder::new(&clock);
    let throttled = throttle_early(clock.clone(), recorder.target(), ms(2500));

    drive(&clock, &[0, 1000, 2000, 3000, 4000], |index| {
        let _ = throttled.call(index);
    });
    clock.run_until_idle();

    assert_eq!(recorder.invocations(), vec![(0, 0), (3000, 3)]);
}

#[rstest]
fn throttle_early_window_state_is_observable() {
    let clock = VirtualScheduler::new();
    let recorder = Recorder::new(&clock);
    let throttled = throttle_early(clock.clone(), recorder.target(), ms(100));

    let control = throttled.call(());
    assert!(control.is_pending());

    clock.advance(ms(100));
    assert!(!control.is_pending());
    assert_eq!(throttled.wait(), ms(100));
}

#[rstest]
fn throttle_early_flush_reopens_immediately() {
    let clock = VirtualScheduler::new();
    let recorder = Recorder::new(&clock);
    let throttled = throttle_early(clock.clone(), recorder.target(), ms(1000));

    let control = throttled.call(1);
    control.flush();
    let _ = throttled.call(2);

    assert_eq!(recorder.arguments(), vec![1, 2]);
}
