//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::time::{Duration, Instant};

/// A monotonic clock.
///
/// The interval timers are generic over this trait so tests can drive them
/// with a fake clock. Note that on Linux `Instant` does not advance while the
/// system is suspended.
pub trait TimeMeasure {
    fn now() -> Self;
    fn elapsed(&self) -> Duration;
    fn since(&self, other: &Self) -> Duration;
}

impl TimeMeasure for Instant {
    fn now() -> Self {
        Instant::now()
    }

    fn elapsed(&self) -> Duration {
        Instant::elapsed(self)
    }

    fn since(&self, other: &Self) -> Duration {
        self.saturating_duration_since(*other)
    }
}
