//
// Copyright (c) Memfault, Inc.
// See License.txt for details
//! Low power halt until an external wake-up signal.
use std::fmt;

use eyre::Result;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

mod command_sleep;
mod gpio_sleep;

pub use command_sleep::CommandSleepController;
pub use gpio_sleep::{GpioSleepController, GPIO_DIR};

/// The line that wakes the node up, as numbered by the GPIO subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WakePin(pub u32);

impl Default for WakePin {
    fn default() -> Self {
        WakePin(3)
    }
}

impl fmt::Display for WakePin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which transition of the wake pin ends the halt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TriggerMode {
    /// Any edge
    #[default]
    Change,
    Rising,
    Falling,
}

#[cfg_attr(test, mockall::automock)]
pub trait SleepController {
    /// Suspend until `pin` sees a `trigger` transition. Returns once the node
    /// is awake again. How long the halt lasted is not reported.
    fn halt_until_signal(&mut self, pin: WakePin, trigger: TriggerMode) -> Result<()>;
}

impl<S: SleepController + ?Sized> SleepController for Box<S> {
    fn halt_until_signal(&mut self, pin: WakePin, trigger: TriggerMode) -> Result<()> {
        (**self).halt_until_signal(pin, trigger)
    }
}
