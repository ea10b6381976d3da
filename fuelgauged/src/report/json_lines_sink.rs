//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::io::{stdout, Stdout, Write};

use chrono::Utc;
use eyre::Result;
use serde_json::json;

use super::{ReportSink, MAX_LOG_LEN};
use crate::util::string::truncate_on_char_boundary;

/// Writes one JSON object per report. Used to pipe reports into another
/// process (or to watch them on a console).
pub struct JsonLinesReportSink<W: Write> {
    writer: W,
}

impl JsonLinesReportSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(stdout())
    }
}

impl<W: Write> JsonLinesReportSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_line(&mut self, value: serde_json::Value) -> Result<()> {
        writeln!(self.writer, "{}", value)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> ReportSink for JsonLinesReportSink<W> {
    fn send_level(&mut self, level: f64, _acknowledged: bool) -> Result<()> {
        // A local write either succeeds or fails, there is nothing to acknowledge.
        self.write_line(json!({
            "type": "battery_level",
            "level": level,
            "timestamp": Utc::now(),
        }))
    }

    fn send_log(&mut self, message: &str) -> Result<()> {
        self.write_line(json!({
            "type": "log",
            "message": truncate_on_char_boundary(message, MAX_LOG_LEN),
            "timestamp": Utc::now(),
        }))
    }
}
