//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use eyre::Result;
use log::{debug, info, trace, warn};

use super::{IntervalTimer, MonitorError};
use crate::gauge::GaugeSource;
use crate::report::ReportSink;
use crate::sleep::{SleepController, TriggerMode, WakePin};
use crate::util::time_measure::TimeMeasure;

const LOG_SENDING_LEVEL: &str = "Sending battery level";
const LOG_DEEP_SLEEP: &str = "Entering deep sleep";

// Consecutive low readings needed before halting.
const DEFAULT_LOW_CONFIRM_MAX: NonZeroU32 = match NonZeroU32::new(3) {
    Some(n) => n,
    None => panic!("low battery confirmation count must not be zero"),
};

/// Everything the monitor needs to know at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub enabled: bool,
    /// Report at this interval, only if the level changed.
    pub soft_interval: Duration,
    /// Report at this interval, even if the level did not change.
    pub forced_interval: Duration,
    /// Below this level (percent) the node is halted once confirmed.
    pub low_threshold_pct: f64,
    /// Number of consecutive low readings confirming a low battery.
    pub low_confirm_max: NonZeroU32,
    pub wake_pin: WakePin,
    pub trigger: TriggerMode,
    /// Mirror the main decisions as log lines through the report sink.
    pub debug_logging: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            soft_interval: Duration::from_millis(60_000),
            forced_interval: Duration::from_millis(180_000),
            low_threshold_pct: 0.0,
            low_confirm_max: DEFAULT_LOW_CONFIRM_MAX,
            wake_pin: WakePin::default(),
            trigger: TriggerMode::default(),
            debug_logging: false,
        }
    }
}

/// What a call to `BatteryMonitor::tick` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The monitor is disabled, nothing was done.
    Disabled,
    /// No timer is due yet, nothing was done.
    Idle,
    /// A reading was taken. `reported` is true if it was transmitted.
    Processed { reported: bool },
    /// A low battery was confirmed: a zero level was reported and the node
    /// was halted. It has woken up again since.
    Halted,
}

/// Samples the fuel gauge on a schedule and decides what gets reported.
///
/// Two timers drive the monitor. When the soft timer is due, the level is
/// reported only if it changed since the last report. When the forced timer
/// is due, it is reported regardless. Every reading below the low threshold
/// increments a confirmation counter; once it reaches `low_confirm_max` the
/// monitor reports a level of zero and halts the node until the wake pin
/// fires.
pub struct BatteryMonitor<G, R, S, T: TimeMeasure = Instant> {
    enabled: bool,
    soft_timer: IntervalTimer<T>,
    forced_timer: IntervalTimer<T>,
    current_level: f64,
    last_reported_level: Option<f64>,
    low_threshold_pct: f64,
    low_confirm_count: u32,
    low_confirm_max: NonZeroU32,
    data_sent: bool,
    wake_pin: WakePin,
    trigger: TriggerMode,
    debug_logging: bool,
    gauge: G,
    sink: R,
    sleeper: S,
}

impl<G, R, S, T> BatteryMonitor<G, R, S, T>
where
    G: GaugeSource,
    R: ReportSink,
    S: SleepController,
    T: TimeMeasure,
{
    /// Both timers start outdated so the first `tick()` takes a reading.
    pub fn new(settings: MonitorSettings, gauge: G, sink: R, sleeper: S) -> Self {
        Self {
            enabled: settings.enabled,
            soft_timer: IntervalTimer::new_outdated(settings.soft_interval),
            forced_timer: IntervalTimer::new_outdated(settings.forced_interval),
            current_level: 0.0,
            last_reported_level: None,
            low_threshold_pct: settings.low_threshold_pct,
            low_confirm_count: 0,
            low_confirm_max: settings.low_confirm_max,
            data_sent: false,
            wake_pin: settings.wake_pin,
            trigger: settings.trigger,
            debug_logging: settings.debug_logging,
            gauge,
            sink,
            sleeper,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A count already past the new maximum is clamped to it, so the next
    /// low reading halts.
    pub fn set_low_confirm_max(&mut self, low_confirm_max: NonZeroU32) {
        self.low_confirm_max = low_confirm_max;
        self.low_confirm_count = self.low_confirm_count.min(low_confirm_max.get());
    }

    /// Start the fuel gauge. Call once before the first `tick()`.
    pub fn initialize(&mut self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.gauge
            .begin()
            .and_then(|_| self.gauge.quick_start())
            .map_err(|e| MonitorError::SourceUnavailable {
                reason: format!("{:#}", e),
            })?;
        Ok(())
    }

    /// Account for `delta` of time which passed without the monitor's clock
    /// noticing, e.g. while the system was suspended.
    pub fn advance_time(&mut self, delta: Duration) {
        debug!("Moving battery timers forward by {:?}", delta);
        self.soft_timer.move_forward(delta);
        self.forced_timer.move_forward(delta);
    }

    /// Run one monitoring cycle if a timer is due. Cheap when nothing is due.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if !self.enabled {
            return Ok(TickOutcome::Disabled);
        }
        if !self.soft_timer.is_outdated() && !self.forced_timer.is_outdated() {
            return Ok(TickOutcome::Idle);
        }
        self.process_cycle()
    }

    fn process_cycle(&mut self) -> Result<TickOutcome> {
        self.data_sent = false;
        // Without a reading there is nothing to report or to confirm. The
        // timers stay outdated so the next tick tries again.
        let level = self
            .gauge
            .read_percentage()
            .map_err(|e| MonitorError::SourceUnavailable {
                reason: format!("{:#}", e),
            })?;
        self.current_level = level;

        let forced_due = self.forced_timer.is_outdated();
        let soft_due = self.soft_timer.is_outdated();
        let changed = self.last_reported_level != Some(level);
        if forced_due || (soft_due && changed) {
            info!("Reporting battery level {}%", level);
            self.report_level(level);
        } else {
            trace!("Battery level unchanged at {}%", level);
        }

        // Each timer restarts only if it is due itself.
        if self.soft_timer.is_outdated() {
            self.soft_timer.reset();
        }
        if self.forced_timer.is_outdated() {
            self.forced_timer.reset();
        }

        if level < self.low_threshold_pct {
            self.low_confirm_count += 1;
            debug!(
                "Battery level {}% below {}% ({}/{})",
                level, self.low_threshold_pct, self.low_confirm_count, self.low_confirm_max
            );
        } else {
            self.low_confirm_count = 0;
        }

        if self.low_confirm_count >= self.low_confirm_max.get() {
            return self.halt();
        }

        Ok(TickOutcome::Processed {
            reported: self.data_sent,
        })
    }

    fn halt(&mut self) -> Result<TickOutcome> {
        warn!(
            "Battery below {}% for {} readings, halting until pin {} {} edge",
            self.low_threshold_pct, self.low_confirm_max, self.wake_pin, self.trigger
        );
        self.low_confirm_count = 0;
        self.current_level = 0.0;
        self.report_level(0.0);
        self.send_diagnostic(LOG_DEEP_SLEEP);

        self.sleeper
            .halt_until_signal(self.wake_pin, self.trigger)
            .map_err(|e| MonitorError::HaltFailed {
                reason: format!("{:#}", e),
            })?;
        Ok(TickOutcome::Halted)
    }

    /// Sent once, a failure is only logged.
    fn report_level(&mut self, level: f64) {
        self.send_diagnostic(LOG_SENDING_LEVEL);
        match self.sink.send_level(level, true) {
            Ok(()) => {
                self.last_reported_level = Some(level);
                self.data_sent = true;
            }
            Err(e) => warn!("Unable to report battery level: {:#}", e),
        }
    }

    fn send_diagnostic(&mut self, message: &str) {
        if !self.debug_logging {
            return;
        }
        if let Err(e) = self.sink.send_log(message) {
            debug!("Unable to send log line: {:#}", e);
        }
    }

    /// True if the last processed cycle transmitted a level.
    pub fn is_data_sent(&self) -> bool {
        self.data_sent
    }

    pub fn soft_timer(&self) -> &IntervalTimer<T> {
        &self.soft_timer
    }

    pub fn forced_timer(&self) -> &IntervalTimer<T> {
        &self.forced_timer
    }

    /// Time until one of the timers is due.
    pub fn time_until_due(&self) -> Duration {
        self.soft_timer
            .remaining()
            .min(self.forced_timer.remaining())
    }

    pub fn current_level(&self) -> f64 {
        self.current_level
    }

    pub fn last_reported_level(&self) -> Option<f64> {
        self.last_reported_level
    }

    pub fn low_confirm_count(&self) -> u32 {
        self.low_confirm_count
    }
}
