//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::str::FromStr;

use eyre::{eyre, ErrReport, Result};
use log::debug;
use strum_macros::Display;

// Valid values of /sys/class/power_supply/<supply_name>/status
// https://www.kernel.org/doc/Documentation/ABI/testing/sysfs-class-power
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ChargingState {
    Charging,
    Discharging,
    Full,
    Unknown,
    #[strum(to_string = "Not charging")]
    NotCharging,
}

impl FromStr for ChargingState {
    type Err = ErrReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Charging" => Ok(ChargingState::Charging),
            "Discharging" => Ok(ChargingState::Discharging),
            "Full" => Ok(ChargingState::Full),
            "Not charging" => Ok(ChargingState::NotCharging),
            "Unknown" => Ok(ChargingState::Unknown),
            other => Err(eyre!("Invalid charging state: {}", other)),
        }
    }
}

/// One sample from a gauge: a state of charge, optionally with the charging
/// state reported alongside it.
///
/// The text form is either `PCT` or `STATE:PCT`, for example `87.5` or
/// `Discharging:87.5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeReading {
    pub soc_pct: f64,
    pub charging_state: Option<ChargingState>,
}

impl GaugeReading {
    fn parse_pct(pct_str: &str) -> Result<f64> {
        let pct = pct_str
            .trim()
            .parse::<f64>()
            .map_err(|e| eyre!("Couldn't parse battery percentage: {}", e))?;
        if !pct.is_finite() {
            return Err(eyre!("Battery percentage is not a number: {}", pct_str));
        }
        if !(0.0..=100.0).contains(&pct) {
            debug!("Clamping out of range battery percentage {}", pct);
        }
        Ok(pct.clamp(0.0, 100.0))
    }
}

impl FromStr for GaugeReading {
    type Err = ErrReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            Some((state_str, pct_str)) => Ok(GaugeReading {
                charging_state: Some(state_str.parse()?),
                soc_pct: Self::parse_pct(pct_str)?,
            }),
            None => Ok(GaugeReading {
                charging_state: None,
                soc_pct: Self::parse_pct(s)?,
            }),
        }
    }
}
