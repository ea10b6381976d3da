//
// Copyright (c) Memfault, Inc.
// See License.txt for details
mod battery_monitor;
mod interval_timer;
mod monitor_error;

pub use battery_monitor::{BatteryMonitor, MonitorSettings, TickOutcome};
pub use interval_timer::IntervalTimer;
pub use monitor_error::{AsMonitorError, MonitorError};
