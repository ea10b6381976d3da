//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::process::Command;

use eyre::{eyre, Result, WrapErr};
use log::{debug, trace};

use super::{GaugeReading, GaugeSource};

/// Gets the state of charge from a shell command.
///
/// The command prints `PCT` or `STATE:PCT` on stdout, e.g. `Discharging:80`.
pub struct CommandGauge {
    command: String,
}

impl CommandGauge {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_owned(),
        }
    }
}

impl GaugeSource for CommandGauge {
    fn begin(&mut self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(eyre!("No gauge command configured"));
        }
        Ok(())
    }

    fn quick_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_percentage(&mut self) -> Result<f64> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .wrap_err_with(|| eyre!("Failed to run `{}`", self.command))?;
        if !output.status.success() {
            return Err(eyre!(
                "`{}` exited with {}. Battery percentage was not captured.",
                self.command,
                output.status
            ));
        }

        let stdout = String::from_utf8(output.stdout)?;
        trace!("Gauge command output: {:?}", stdout);
        let reading: GaugeReading = stdout.parse()?;
        if let Some(state) = reading.charging_state {
            debug!("Battery {} at {}%", state, reading.soc_pct);
        }
        Ok(reading.soc_pct)
    }
}
