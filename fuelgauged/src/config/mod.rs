//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::path::Path;
use std::time::Duration;

use eyre::{Result, WrapErr};

use crate::gauge::{CommandGauge, GaugeSource, SysfsGauge};
use crate::monitor::MonitorSettings;
use crate::report::{HttpReportSink, HttpSinkConfig, JsonLinesReportSink, ReportSink};
use crate::sleep::{CommandSleepController, GpioSleepController, SleepController};

pub use config_file::{FuelgaugedConfig, GaugeConfig, ReportConfig, SleepConfig};

mod config_file;

/// Container of the entire fuelgauged configuration.
/// Implement `From<&Config>` to initialize module specific configuration (see `MonitorSettings`).
#[derive(Debug, Clone)]
pub struct Config {
    pub config_file: FuelgaugedConfig,
}

impl Config {
    pub const DEFAULT_CONFIG_PATH: &'static str = FuelgaugedConfig::DEFAULT_CONFIG_PATH;

    pub fn read_from_system(user_config: Option<&Path>) -> Result<Self> {
        let config_file = FuelgaugedConfig::load(user_config)?;
        Ok(Self { config_file })
    }

    pub fn tick_interval(&self) -> Duration {
        self.config_file.tick_interval
    }

    pub fn error_retry(&self) -> Duration {
        self.config_file.error_retry
    }

    pub fn build_gauge(&self) -> Box<dyn GaugeSource> {
        match &self.config_file.gauge {
            GaugeConfig::Sysfs {
                power_supply_dir,
                supply_name,
            } => Box::new(SysfsGauge::new(power_supply_dir, supply_name)),
            GaugeConfig::Command { command } => Box::new(CommandGauge::new(command)),
        }
    }

    pub fn build_report_sink(&self) -> Result<Box<dyn ReportSink>> {
        match &self.config_file.report {
            ReportConfig::Stdout => Ok(Box::new(JsonLinesReportSink::stdout())),
            ReportConfig::Http { .. } => {
                let sink = HttpReportSink::new(HttpSinkConfig::try_from(self)?)
                    .wrap_err("Unable to prepare HTTP report sink")?;
                Ok(Box::new(sink))
            }
        }
    }

    pub fn build_sleep_controller(&self) -> Box<dyn SleepController> {
        match &self.config_file.sleep {
            SleepConfig::Gpio { gpio_dir } => Box::new(GpioSleepController::new(gpio_dir)),
            SleepConfig::Command { command } => Box::new(CommandSleepController::new(command)),
        }
    }
}

impl From<&Config> for MonitorSettings {
    fn from(config: &Config) -> Self {
        let c = &config.config_file;
        Self {
            enabled: c.enable_monitor,
            soft_interval: c.soft_report_interval,
            forced_interval: c.forced_report_interval,
            low_threshold_pct: c.low_battery_threshold_pct,
            low_confirm_max: c.low_battery_confirm_count,
            wake_pin: c.wake_pin,
            trigger: c.wake_trigger,
            debug_logging: c.debug_logging,
        }
    }
}

impl TryFrom<&Config> for HttpSinkConfig {
    type Error = eyre::Report;

    fn try_from(config: &Config) -> Result<Self> {
        match &config.config_file.report {
            ReportConfig::Http {
                base_url,
                node_id,
                timeout,
            } => Ok(Self {
                base_url: base_url.clone(),
                node_id: node_id.clone(),
                timeout: *timeout,
            }),
            ReportConfig::Stdout => Err(eyre::eyre!("Report sink is not configured for HTTP")),
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn test_fixture() -> Self {
        Config {
            config_file: FuelgaugedConfig::test_fixture(),
        }
    }
}
