//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::Write;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;

use eyre::{eyre, Result};
use serde_json::Value;

use fuelgauged::gauge::GaugeSource;
use fuelgauged::monitor::{
    AsMonitorError, BatteryMonitor, MonitorError, MonitorSettings, TickOutcome,
};
use fuelgauged::report::JsonLinesReportSink;
use fuelgauged::sleep::{SleepController, TriggerMode, WakePin};
use fuelgauged::util::time_measure::TimeMeasure;

thread_local! {
    static NOW_MS: Cell<u64> = Cell::new(0);
}

#[derive(Debug, Clone, Copy)]
struct FakeInstant(u64);

impl FakeInstant {
    fn advance(ms: u64) {
        NOW_MS.with(|now| now.set(now.get() + ms));
    }
}

impl TimeMeasure for FakeInstant {
    fn now() -> Self {
        FakeInstant(NOW_MS.with(|now| now.get()))
    }

    fn elapsed(&self) -> Duration {
        Self::now().since(self)
    }

    fn since(&self, other: &Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(other.0))
    }
}

struct ScriptedGauge {
    levels: VecDeque<Option<f64>>,
}

impl ScriptedGauge {
    fn new(levels: &[Option<f64>]) -> Self {
        Self {
            levels: levels.iter().copied().collect(),
        }
    }
}

impl GaugeSource for ScriptedGauge {
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn quick_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_percentage(&mut self) -> Result<f64> {
        self.levels
            .pop_front()
            .flatten()
            .ok_or_else(|| eyre!("gauge did not answer"))
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn lines(&self) -> Vec<Value> {
        let buf = self.0.borrow();
        std::str::from_utf8(&buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn levels(&self) -> Vec<f64> {
        self.lines()
            .iter()
            .filter(|l| l["type"] == "battery_level")
            .map(|l| l["level"].as_f64().unwrap())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingSleeper {
    halts: Rc<RefCell<Vec<(WakePin, TriggerMode)>>>,
}

impl SleepController for RecordingSleeper {
    fn halt_until_signal(&mut self, pin: WakePin, trigger: TriggerMode) -> Result<()> {
        self.halts.borrow_mut().push((pin, trigger));
        Ok(())
    }
}

type Monitor =
    BatteryMonitor<ScriptedGauge, JsonLinesReportSink<SharedBuffer>, RecordingSleeper, FakeInstant>;

fn settings() -> MonitorSettings {
    MonitorSettings {
        soft_interval: Duration::from_millis(1000),
        forced_interval: Duration::from_millis(5000),
        low_threshold_pct: 20.0,
        low_confirm_max: NonZeroU32::new(2).unwrap(),
        ..Default::default()
    }
}

fn monitor(
    settings: MonitorSettings,
    levels: &[Option<f64>],
) -> (Monitor, SharedBuffer, RecordingSleeper) {
    let output = SharedBuffer::default();
    let sleeper = RecordingSleeper::default();
    let mut monitor = Monitor::new(
        settings,
        ScriptedGauge::new(levels),
        JsonLinesReportSink::new(output.clone()),
        sleeper.clone(),
    );
    monitor.initialize().unwrap();
    (monitor, output, sleeper)
}

#[test]
fn low_battery_is_reported_and_halts_then_recovers_after_wake_up() {
    let (mut monitor, output, sleeper) = monitor(
        settings(),
        &[Some(50.0), Some(50.0), Some(50.0), Some(10.0), Some(10.0), Some(80.0)],
    );

    let mut outcomes = vec![];
    for _ in 0..5 {
        outcomes.push(monitor.tick().unwrap());
        FakeInstant::advance(1000);
    }

    assert_eq!(
        outcomes,
        vec![
            TickOutcome::Processed { reported: true },
            TickOutcome::Processed { reported: false },
            TickOutcome::Processed { reported: false },
            TickOutcome::Processed { reported: true },
            TickOutcome::Halted,
        ]
    );
    assert_eq!(output.levels(), vec![50.0, 10.0, 0.0]);
    assert_eq!(*sleeper.halts.borrow(), vec![(WakePin(3), TriggerMode::Change)]);
    assert_eq!(monitor.last_reported_level(), Some(0.0));
    assert_eq!(monitor.low_confirm_count(), 0);

    // The node slept for an hour. The monotonic clock did not see it.
    monitor.advance_time(Duration::from_secs(3600));
    assert_eq!(monitor.time_until_due(), Duration::ZERO);

    assert_eq!(
        monitor.tick().unwrap(),
        TickOutcome::Processed { reported: true }
    );
    assert_eq!(output.levels(), vec![50.0, 10.0, 0.0, 80.0]);
    assert_eq!(sleeper.halts.borrow().len(), 1);
}

#[test]
fn idle_between_deadlines() {
    let (mut monitor, output, _) = monitor(settings(), &[Some(70.0)]);

    assert!(monitor.tick().is_ok());
    assert_eq!(monitor.time_until_due(), Duration::from_millis(1000));

    FakeInstant::advance(400);
    assert_eq!(monitor.tick().unwrap(), TickOutcome::Idle);
    assert_eq!(monitor.time_until_due(), Duration::from_millis(600));
    assert_eq!(output.levels(), vec![70.0]);
}

#[test]
fn missing_reading_is_retried_on_next_tick() {
    let (mut monitor, output, _) = monitor(settings(), &[None, Some(64.0)]);

    let err = monitor.tick().unwrap_err();
    assert!(matches!(
        err.as_monitor_error(),
        Some(MonitorError::SourceUnavailable { .. })
    ));
    assert!(!monitor.is_data_sent());
    assert!(output.levels().is_empty());

    // Timers are still due, no need to wait.
    assert_eq!(
        monitor.tick().unwrap(),
        TickOutcome::Processed { reported: true }
    );
    assert_eq!(output.levels(), vec![64.0]);
}

#[test]
fn debug_logging_mirrors_decisions_in_the_output() {
    let (mut monitor, output, _) = monitor(
        MonitorSettings {
            debug_logging: true,
            low_confirm_max: NonZeroU32::new(1).unwrap(),
            ..settings()
        },
        &[Some(5.0)],
    );

    assert_eq!(monitor.tick().unwrap(), TickOutcome::Halted);

    let kinds: Vec<(String, String)> = output
        .lines()
        .iter()
        .map(|l| {
            let detail = match l["type"].as_str().unwrap() {
                "log" => l["message"].as_str().unwrap().to_owned(),
                _ => l["level"].to_string(),
            };
            (l["type"].as_str().unwrap().to_owned(), detail)
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("log".to_owned(), "Sending battery level".to_owned()),
            ("battery_level".to_owned(), "5.0".to_owned()),
            ("log".to_owned(), "Sending battery level".to_owned()),
            ("battery_level".to_owned(), "0.0".to_owned()),
            ("log".to_owned(), "Entering deep sleep".to_owned()),
        ]
    );
}

#[test]
fn disabled_monitor_leaves_collaborators_alone() {
    let (mut monitor, output, sleeper) = monitor(
        MonitorSettings {
            enabled: false,
            ..settings()
        },
        &[],
    );

    assert_eq!(monitor.tick().unwrap(), TickOutcome::Disabled);
    assert!(output.lines().is_empty());
    assert!(sleeper.halts.borrow().is_empty());
}
