//
// Copyright (c) Memfault, Inc.
// See License.txt for details
//! Destinations for battery level reports and diagnostic log lines.
use eyre::Result;

mod http_sink;
mod json_lines_sink;

pub use http_sink::{HttpReportSink, HttpSinkConfig};
pub use json_lines_sink::JsonLinesReportSink;

/// Longest diagnostic log line a sink transmits, in bytes.
pub const MAX_LOG_LEN: usize = 25;

#[cfg_attr(test, mockall::automock)]
pub trait ReportSink {
    /// Transmit a battery level. `acknowledged` asks the transport to confirm
    /// delivery; an unconfirmed delivery is then reported as an error.
    fn send_level(&mut self, level: f64, acknowledged: bool) -> Result<()>;

    /// Transmit a short diagnostic line (truncated to `MAX_LOG_LEN` bytes).
    fn send_log(&mut self, message: &str) -> Result<()>;
}

impl<R: ReportSink + ?Sized> ReportSink for Box<R> {
    fn send_level(&mut self, level: f64, acknowledged: bool) -> Result<()> {
        (**self).send_level(level, acknowledged)
    }

    fn send_log(&mut self, message: &str) -> Result<()> {
        (**self).send_log(message)
    }
}
