//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use eyre::{eyre, Result, WrapErr};
use log::{debug, info, trace};

use super::{ChargingState, GaugeReading, GaugeSource};

pub const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

/// Reads the state of charge exposed by a kernel power_supply driver
/// (`<power_supply_dir>/<supply_name>/capacity`).
pub struct SysfsGauge {
    supply_path: PathBuf,
}

impl SysfsGauge {
    pub fn new(power_supply_dir: &Path, supply_name: &str) -> Self {
        Self {
            supply_path: power_supply_dir.join(supply_name),
        }
    }

    fn read_attribute(&self, name: &str) -> Result<String> {
        let path = self.supply_path.join(name);
        read_to_string(&path).wrap_err_with(|| eyre!("Unable to read {}", path.display()))
    }

    /// Contents of the optional `status` attribute.
    fn charging_state(&self) -> Option<ChargingState> {
        match self.read_attribute("status").and_then(|s| s.parse()) {
            Ok(state) => Some(state),
            Err(e) => {
                trace!("No charging state: {:#}", e);
                None
            }
        }
    }
}

impl GaugeSource for SysfsGauge {
    fn begin(&mut self) -> Result<()> {
        if !self.supply_path.is_dir() {
            return Err(eyre!(
                "Power supply {} not found",
                self.supply_path.display()
            ));
        }
        info!("Using fuel gauge at {}", self.supply_path.display());
        Ok(())
    }

    fn quick_start(&mut self) -> Result<()> {
        // The kernel driver owns the gauge and its calibration.
        debug!("Quick start not available through sysfs, skipping");
        Ok(())
    }

    fn read_percentage(&mut self) -> Result<f64> {
        let capacity = self.read_attribute("capacity")?;
        let reading: GaugeReading = capacity.parse()?;
        if let Some(state) = self.charging_state() {
            debug!("Battery {} at {}%", state, reading.soc_pct);
        }
        Ok(reading.soc_pct)
    }
}
