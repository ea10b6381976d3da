//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{eyre, Result, WrapErr};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sleep::{TriggerMode, WakePin};
use crate::util::serialization::milliseconds_to_duration;
use crate::util::string;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FuelgaugedConfig {
    pub enable_monitor: bool,
    pub debug_logging: bool,
    #[serde(rename = "tick_interval_ms", with = "milliseconds_to_duration")]
    pub tick_interval: Duration,
    #[serde(rename = "error_retry_ms", with = "milliseconds_to_duration")]
    pub error_retry: Duration,
    #[serde(rename = "soft_report_interval_ms", with = "milliseconds_to_duration")]
    pub soft_report_interval: Duration,
    #[serde(rename = "forced_report_interval_ms", with = "milliseconds_to_duration")]
    pub forced_report_interval: Duration,
    pub low_battery_threshold_pct: f64,
    pub low_battery_confirm_count: NonZeroU32,
    pub wake_pin: WakePin,
    pub wake_trigger: TriggerMode,
    pub gauge: GaugeConfig,
    pub report: ReportConfig,
    pub sleep: SleepConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GaugeConfig {
    Sysfs {
        power_supply_dir: PathBuf,
        supply_name: String,
    },
    Command {
        command: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportConfig {
    Stdout,
    Http {
        base_url: String,
        node_id: String,
        #[serde(rename = "timeout_ms", with = "milliseconds_to_duration")]
        timeout: Duration,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SleepConfig {
    Gpio { gpio_dir: PathBuf },
    Command { command: String },
}

impl FuelgaugedConfig {
    pub const DEFAULT_CONFIG_PATH: &'static str = "/etc/fuelgauged.conf";

    pub fn load(config_path: Option<&Path>) -> Result<FuelgaugedConfig> {
        let config = Self::parse_configs(config_path)?;
        // Transform the JSON object into a typed structure.
        let config: FuelgaugedConfig = serde_json::from_value(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Builtin configuration merged with the user configuration file.
    ///
    /// An explicitly given file must exist. The default file is optional.
    pub fn parse_configs(config_path: Option<&Path>) -> Result<Value> {
        let mut config = Self::parse(include_str!("../../builtin.conf"))?;

        let user_config = match config_path {
            Some(path) => Some(Self::read(path)?),
            None => {
                let default_path = Path::new(Self::DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Some(Self::read(default_path)?)
                } else {
                    info!(
                        "No {} found, using builtin configuration",
                        Self::DEFAULT_CONFIG_PATH
                    );
                    None
                }
            }
        };
        if let Some(user_config) = user_config {
            Self::merge_into(&mut config, user_config);
        }
        Ok(config)
    }

    fn read(path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| eyre!("Unable to read {}", path.display()))?;
        Self::parse(&content).wrap_err_with(|| eyre!("Invalid configuration {}", path.display()))
    }

    // Parse a JSON configuration (with optional C-style comments).
    fn parse(config_string: &str) -> Result<Value> {
        let json_text = string::remove_comments(config_string);
        let json: Value = serde_json::from_str(json_text.as_str())?;
        if !json.is_object() {
            return Err(eyre!("Configuration should be a JSON object."));
        }
        Ok(json)
    }

    /// Merge two JSON objects together. The values from the second one will override values in the first one.
    fn merge_into(dest: &mut Value, src: Value) {
        if let Value::Object(src_map) = src {
            for (key, value) in src_map {
                if let Some(obj) = dest.get_mut(&key) {
                    if obj.is_object() && value.is_object() {
                        Self::merge_into(obj, value);
                        continue;
                    }
                }
                dest[&key] = value;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.low_battery_threshold_pct) {
            return Err(eyre!(
                "low_battery_threshold_pct must be between 0 and 100 (got {})",
                self.low_battery_threshold_pct
            ));
        }
        for (name, interval) in [
            ("tick_interval_ms", self.tick_interval),
            ("error_retry_ms", self.error_retry),
            ("soft_report_interval_ms", self.soft_report_interval),
            ("forced_report_interval_ms", self.forced_report_interval),
        ] {
            if interval.is_zero() {
                return Err(eyre!("{} must be greater than 0", name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
impl FuelgaugedConfig {
    pub fn test_fixture() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("fuelgauged.conf");
        fs::write(&config_path, "{}").unwrap();
        FuelgaugedConfig::load(Some(&config_path)).unwrap()
    }
}
