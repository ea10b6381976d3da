//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::process::Command;

use eyre::{eyre, Result, WrapErr};
use log::info;

use super::{SleepController, TriggerMode, WakePin};

/// Runs a shell command which returns once the node has woken up, for
/// instance one that arms a wake source and suspends the system.
///
/// `{pin}` and `{trigger}` in the command are replaced by the wake pin number
/// and the trigger mode (`change`, `rising` or `falling`).
pub struct CommandSleepController {
    command_template: String,
}

impl CommandSleepController {
    pub fn new(command_template: &str) -> Self {
        Self {
            command_template: command_template.to_owned(),
        }
    }

    fn command_for(&self, pin: WakePin, trigger: TriggerMode) -> String {
        self.command_template
            .replace("{pin}", &pin.to_string())
            .replace("{trigger}", &trigger.to_string())
    }
}

impl SleepController for CommandSleepController {
    fn halt_until_signal(&mut self, pin: WakePin, trigger: TriggerMode) -> Result<()> {
        let command = self.command_for(pin, trigger);
        info!("Halting with `{}`", command);

        let status = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .status()
            .wrap_err_with(|| eyre!("Failed to run `{}`", command))?;
        if !status.success() {
            return Err(eyre!("`{}` exited with {}", command, status));
        }
        info!("Woken up");
        Ok(())
    }
}
