//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use eyre::{eyre, Result, WrapErr};
use log::{error, info, trace};
use signal_hook::SigId;

use crate::config::Config;
use crate::gauge::GaugeSource;
use crate::monitor::{AsMonitorError, BatteryMonitor, MonitorError, MonitorSettings, TickOutcome};
use crate::report::ReportSink;
use crate::sleep::SleepController;
use crate::util::task::{loop_with_exponential_error_backoff, LoopContinuation};
use crate::util::time_measure::TimeMeasure;

#[derive(Debug, PartialEq, Eq)]
pub enum FuelgaugedLoopResult {
    Terminate,
    Relaunch,
}

pub fn fuelgauged_loop(config: Config) -> Result<FuelgaugedLoopResult> {
    let mut signal_ids: Vec<SigId> = vec![];

    // Register a flag which will be set when one of these signals is received.
    let term_signals = [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM];
    let term = Arc::new(AtomicBool::new(false));
    for signal in term_signals {
        signal_ids.push(signal_hook::flag::register(signal, Arc::clone(&term))?);
    }

    // SIGHUP reloads the configuration (reload = relaunch)
    let reload = Arc::new(AtomicBool::new(false));
    signal_ids.push(signal_hook::flag::register(
        signal_hook::consts::SIGHUP,
        Arc::clone(&reload),
    )?);

    // SIGUSR1 toggles the monitor on and off
    let toggle = Arc::new(AtomicBool::new(false));
    signal_ids.push(signal_hook::flag::register(
        signal_hook::consts::SIGUSR1,
        Arc::clone(&toggle),
    )?);

    let sink = config
        .build_report_sink()
        .wrap_err(eyre!("Unable to prepare report sink"))?;
    let mut monitor = BatteryMonitor::<_, _, _, Instant>::new(
        MonitorSettings::from(&config),
        config.build_gauge(),
        sink,
        config.build_sleep_controller(),
    );
    let mut initialized = false;
    let tick_interval = config.tick_interval();

    info!(
        "fuelgauged started (monitor {})",
        if monitor.is_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );

    loop_with_exponential_error_backoff(
        || {
            if toggle.swap(false, Ordering::Relaxed) {
                monitor.set_enabled(!monitor.is_enabled());
                info!(
                    "Battery monitor {}",
                    if monitor.is_enabled() {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
            }

            if monitor.is_enabled() && !initialized {
                monitor.initialize()?;
                initialized = true;
            }

            tick_monitor(&mut monitor, tick_interval, &term)
        },
        || match (
            term.load(Ordering::Relaxed) || reload.load(Ordering::Relaxed),
            toggle.load(Ordering::Relaxed),
        ) {
            // Stop when we receive a term signal
            (true, _) => LoopContinuation::Stop,
            // Apply a SIGUSR1 received while we were in the loop right away.
            (false, true) => LoopContinuation::RerunImmediately,
            (false, false) => LoopContinuation::KeepRunning,
        },
        tick_interval,
        config.error_retry(),
    );
    info!("fuelgauged shutting down...");

    for id in signal_ids {
        signal_hook::low_level::unregister(id);
    }

    if reload.load(Ordering::Relaxed) {
        Ok(FuelgaugedLoopResult::Relaunch)
    } else {
        Ok(FuelgaugedLoopResult::Terminate)
    }
}

/// Run one tick and return how long to wait before the next one.
///
/// A disabled monitor waits a full `tick_interval`: its timers are not
/// serviced so they may stay due.
fn tick_monitor<G, R, S, T>(
    monitor: &mut BatteryMonitor<G, R, S, T>,
    tick_interval: Duration,
    stopping: &AtomicBool,
) -> Result<Duration>
where
    G: GaugeSource,
    R: ReportSink,
    S: SleepController,
    T: TimeMeasure,
{
    let clock = SuspendClock::start();
    match monitor.tick() {
        Ok(TickOutcome::Disabled) => return Ok(tick_interval),
        Ok(TickOutcome::Halted) => {
            let missed = clock.missed_time();
            if !missed.is_zero() {
                info!("Woke up after {:?} of suspend", missed);
                monitor.advance_time(missed);
            }
        }
        Ok(outcome) => trace!("Tick: {:?}", outcome),
        Err(e) => {
            // A halt interrupted by a shutdown signal is expected.
            if let Some(MonitorError::HaltFailed { .. }) = e.as_monitor_error() {
                if !stopping.load(Ordering::Relaxed) {
                    error!("Low battery confirmed but the node could not be halted");
                }
            }
            return Err(e);
        }
    }

    Ok(monitor.time_until_due())
}

/// Pairs the wall clock with the monotonic clock to find out how long the
/// system was suspended. The monotonic clock does not advance during suspend.
struct SuspendClock {
    wall: DateTime<Utc>,
    monotonic: Instant,
}

impl SuspendClock {
    fn start() -> Self {
        Self {
            wall: Utc::now(),
            monotonic: Instant::now(),
        }
    }

    fn missed_time(&self) -> Duration {
        suspension_compensation(Utc::now() - self.wall, self.monotonic.elapsed())
    }
}

/// Time that passed on the wall clock but not on the monotonic clock.
///
/// Zero when the wall clock went backwards or did not get ahead of the
/// monotonic clock.
fn suspension_compensation(wall_elapsed: chrono::Duration, monotonic_elapsed: Duration) -> Duration {
    wall_elapsed
        .to_std()
        .map(|wall| wall.saturating_sub(monotonic_elapsed))
        .unwrap_or(Duration::ZERO)
}
