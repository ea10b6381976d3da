//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::time::{Duration, Instant};

use crate::util::time_measure::TimeMeasure;

/// A restartable countdown.
///
/// The timer is outdated once its deadline has passed. The deadline is
/// `started_at + period - credit` where `credit` is time the owner knows has
/// passed without the clock observing it (e.g. a system suspend, during which
/// the monotonic clock stops).
#[derive(Debug, Clone)]
pub struct IntervalTimer<T: TimeMeasure = Instant> {
    period: Duration,
    started_at: T,
    credit: Duration,
}

impl<T: TimeMeasure> IntervalTimer<T> {
    /// A timer expiring one `period` from now.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            started_at: T::now(),
            credit: Duration::ZERO,
        }
    }

    /// A timer which is already outdated. After the first `reset()` it
    /// behaves like `new(period)`.
    pub fn new_outdated(period: Duration) -> Self {
        Self {
            period,
            started_at: T::now(),
            credit: period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_outdated(&self) -> bool {
        self.started_at.elapsed().saturating_add(self.credit) >= self.period
    }

    /// Restart the countdown: the deadline becomes now + period.
    pub fn reset(&mut self) {
        self.started_at = T::now();
        self.credit = Duration::ZERO;
    }

    /// Bring the deadline `delta` closer.
    pub fn move_forward(&mut self, delta: Duration) {
        self.credit = self.credit.saturating_add(delta);
    }

    /// Time left before the timer becomes outdated (zero when outdated).
    pub fn remaining(&self) -> Duration {
        self.period
            .saturating_sub(self.started_at.elapsed().saturating_add(self.credit))
    }
}
