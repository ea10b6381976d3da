//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::fs::{write, File};
use std::io::{Read, Seek, SeekFrom};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use eyre::{eyre, Result, WrapErr};
use log::{debug, info};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags};

use super::{SleepController, TriggerMode, WakePin};

pub const GPIO_DIR: &str = "/sys/class/gpio";

/// Blocks on an exported sysfs GPIO until the configured edge fires.
///
/// The pin must already be exported and configured as an input. The process
/// sleeps in `poll(2)`; whether the rest of the system suspends is up to the
/// platform's power management.
pub struct GpioSleepController {
    gpio_dir: PathBuf,
}

impl GpioSleepController {
    pub fn new(gpio_dir: &Path) -> Self {
        Self {
            gpio_dir: gpio_dir.to_owned(),
        }
    }

    fn pin_dir(&self, pin: WakePin) -> PathBuf {
        self.gpio_dir.join(format!("gpio{}", pin))
    }

    fn edge(trigger: TriggerMode) -> &'static str {
        match trigger {
            TriggerMode::Change => "both",
            TriggerMode::Rising => "rising",
            TriggerMode::Falling => "falling",
        }
    }

    /// Configure the edge and open the value file, ready for polling.
    fn arm(&self, pin: WakePin, trigger: TriggerMode) -> Result<File> {
        let pin_dir = self.pin_dir(pin);
        write(pin_dir.join("edge"), Self::edge(trigger))
            .wrap_err_with(|| eyre!("Unable to set edge of GPIO {}", pin))?;

        let mut value = File::open(pin_dir.join("value"))
            .wrap_err_with(|| eyre!("Unable to open value of GPIO {}", pin))?;
        // Reading clears any edge which fired before we started waiting.
        let mut current = String::new();
        value.read_to_string(&mut current)?;
        debug!("GPIO {} armed on {}, value {}", pin, trigger, current.trim());
        Ok(value)
    }

    /// False when the wait was cut short by a signal (shutdown or reload).
    fn edge_fired(poll_result: nix::Result<i32>, pin: WakePin) -> Result<bool> {
        match poll_result {
            Ok(_) => Ok(true),
            Err(Errno::EINTR) => {
                info!("Wait on GPIO {} interrupted by a signal", pin);
                Ok(false)
            }
            Err(e) => Err(eyre!("Waiting on GPIO {} failed: {}", pin, e)),
        }
    }
}

impl SleepController for GpioSleepController {
    fn halt_until_signal(&mut self, pin: WakePin, trigger: TriggerMode) -> Result<()> {
        let mut value = self.arm(pin, trigger)?;

        info!("Halting until GPIO {} {} edge", pin, trigger);
        let mut fds = [PollFd::new(
            value.as_raw_fd(),
            PollFlags::POLLPRI | PollFlags::POLLERR,
        )];
        if !Self::edge_fired(poll(&mut fds, -1), pin)? {
            return Ok(());
        }

        value.seek(SeekFrom::Start(0))?;
        let mut woke_with = String::new();
        value.read_to_string(&mut woke_with)?;
        info!("Woken up by GPIO {} (value {})", pin, woke_with.trim());
        Ok(())
    }
}
