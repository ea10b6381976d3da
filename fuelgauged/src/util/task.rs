//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use eyre::Result;
use std::time::Duration;

use log::{trace, warn};

/// Run `work` repeatedly while `condition` allows it.
///
/// `work` returns how long it would like to wait before the next run. The wait
/// is never longer than `max_period`, so the loop still wakes up regularly to
/// check `condition` and pick up external changes.
///
/// On error, wait `error_retry` and multiply it by 2 every time the error is
/// repeated, never exceeding `max_period`. A successful run resets the backoff.
///
/// Sleeping is interrupted by signals so a SIGTERM or SIGUSR1 is acted upon
/// right away. (The signal has to be caught somewhere, otherwise the process
/// terminates.)
pub fn loop_with_exponential_error_backoff<
    W: FnMut() -> Result<Duration>,
    T: FnMut() -> LoopContinuation,
>(
    work: W,
    condition: T,
    max_period: Duration,
    error_retry: Duration,
) {
    loop_with_exponential_error_backoff_internal(
        work,
        condition,
        max_period,
        error_retry,
        interruptible_sleep,
    )
}

// std::thread::sleep resumes sleeping after a signal, shuteye::sleep returns early.
fn interruptible_sleep(d: Duration) {
    shuteye::sleep(d);
}

/// Specify how to continue execution
#[derive(PartialEq, Eq, Debug)]
pub enum LoopContinuation {
    /// Wait for the requested delay, then run again
    KeepRunning,
    /// Run again without waiting
    RerunImmediately,
    /// Stop running the loop
    Stop,
}

pub(crate) fn loop_with_exponential_error_backoff_internal<
    W: FnMut() -> Result<Duration>,
    T: FnMut() -> LoopContinuation,
>(
    mut work: W,
    mut condition: T,
    max_period: Duration,
    error_retry: Duration,
    sleep: fn(Duration),
) {
    const BACKOFF_MULTIPLIER: u32 = 2;
    let mut count_errors_since_success = 0;
    while condition() != LoopContinuation::Stop {
        let next_run_in = match work() {
            Ok(requested) => {
                count_errors_since_success = 0;
                requested.min(max_period)
            }
            Err(e) => {
                let next_run = Duration::min(
                    error_retry.saturating_mul(
                        BACKOFF_MULTIPLIER.saturating_pow(count_errors_since_success),
                    ),
                    max_period,
                );

                count_errors_since_success += 1;
                warn!("Error in fuelgauged monitor loop: {:#}", e);
                next_run
            }
        };

        if condition() == LoopContinuation::KeepRunning && !next_run_in.is_zero() {
            trace!("Sleep for {:?}", next_run_in);
            sleep(next_run_in);
        }
    }
}
