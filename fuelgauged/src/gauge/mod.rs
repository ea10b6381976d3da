//
// Copyright (c) Memfault, Inc.
// See License.txt for details
//! Fuel gauge sources.
//!
//! The monitor only needs a state of charge in percent. Talking to the gauge
//! chip itself is left to the kernel driver or to an external command.
use eyre::Result;

mod command_gauge;
mod reading;
mod sysfs_gauge;

pub use command_gauge::CommandGauge;
pub use reading::{ChargingState, GaugeReading};
pub use sysfs_gauge::{SysfsGauge, POWER_SUPPLY_DIR};

#[cfg_attr(test, mockall::automock)]
pub trait GaugeSource {
    /// Open the link to the gauge.
    fn begin(&mut self) -> Result<()>;

    /// Ask the gauge to restart its state of charge estimation.
    fn quick_start(&mut self) -> Result<()>;

    /// State of charge, in percent (0 to 100).
    fn read_percentage(&mut self) -> Result<f64>;
}

impl<G: GaugeSource + ?Sized> GaugeSource for Box<G> {
    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn quick_start(&mut self) -> Result<()> {
        (**self).quick_start()
    }

    fn read_percentage(&mut self) -> Result<f64> {
        (**self).read_percentage()
    }
}
