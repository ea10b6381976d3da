//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use eyre::Report;
use thiserror::Error;

/// Failures of a monitor cycle the host may want to tell apart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Fuel gauge unavailable: {reason}")]
    SourceUnavailable { reason: String },
    #[error("Unable to halt: {reason}")]
    HaltFailed { reason: String },
}

pub trait AsMonitorError {
    /// The `MonitorError` carried by this error, if any.
    fn as_monitor_error(&self) -> Option<&MonitorError>;
}

impl AsMonitorError for Report {
    fn as_monitor_error(&self) -> Option<&MonitorError> {
        self.downcast_ref::<MonitorError>()
    }
}

#[cfg(test)]
mod tests {
    use eyre::{eyre, WrapErr};
    use rstest::*;

    use super::*;

    #[rstest]
    #[case(eyre!("Some error"), None)]
    #[case(
        eyre!(MonitorError::SourceUnavailable { reason: "i2c timeout".to_owned() }),
        Some(MonitorError::SourceUnavailable { reason: "i2c timeout".to_owned() })
    )]
    #[case(
        Err::<(), _>(MonitorError::HaltFailed { reason: "no gpio".to_owned() })
            .wrap_err("Cycle failed")
            .unwrap_err(),
        Some(MonitorError::HaltFailed { reason: "no gpio".to_owned() })
    )]
    fn finds_monitor_error(#[case] report: Report, #[case] expected: Option<MonitorError>) {
        assert_eq!(report.as_monitor_error(), expected.as_ref());
    }

    #[rstest]
    fn displays_reason() {
        let error = MonitorError::SourceUnavailable {
            reason: "i2c timeout".to_owned(),
        };
        assert_eq!(error.to_string(), "Fuel gauge unavailable: i2c timeout");
    }
}
