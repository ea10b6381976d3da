//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::time::Duration;

use chrono::{DateTime, Utc};
use eyre::{eyre, Result};
use log::{debug, trace};
use reqwest::{blocking, header};
use serde::Serialize;

use super::{ReportSink, MAX_LOG_LEN};
use crate::util::string::truncate_on_char_boundary;

const LEVEL_ENDPOINT: &str = "/v1/battery/level";
const LOG_ENDPOINT: &str = "/v1/log";

/// What is needed to talk to the collector.
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    pub base_url: String,
    pub node_id: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct LevelReport<'a> {
    node_id: &'a str,
    level: f64,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct LogReport<'a> {
    node_id: &'a str,
    message: &'a str,
    timestamp: DateTime<Utc>,
}

/// Posts reports as JSON to a collector over HTTP.
pub struct HttpReportSink {
    client: blocking::Client,
    config: HttpSinkConfig,
}

impl HttpReportSink {
    pub fn new(config: HttpSinkConfig) -> Result<Self> {
        let headers = [
            (
                header::ACCEPT,
                header::HeaderValue::from_static("application/json"),
            ),
            (
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/json"),
            ),
        ]
        .into_iter()
        .collect();

        let client = blocking::ClientBuilder::new()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    fn level_payload(&self, level: f64, timestamp: DateTime<Utc>) -> Result<String> {
        Ok(serde_json::to_string(&LevelReport {
            node_id: &self.config.node_id,
            level,
            timestamp,
        })?)
    }

    fn log_payload(&self, message: &str, timestamp: DateTime<Utc>) -> Result<String> {
        Ok(serde_json::to_string(&LogReport {
            node_id: &self.config.node_id,
            message: truncate_on_char_boundary(message, MAX_LOG_LEN),
            timestamp,
        })?)
    }

    fn post(&self, endpoint: &str, payload: String, acknowledged: bool) -> Result<()> {
        let url = self.url(endpoint);
        debug!("POST {} - Payload {} bytes", url, payload.len());
        trace!("{}", payload);

        let response = self
            .client
            .post(&url)
            .body(payload)
            .send()
            .map_err(|e| eyre!("Unable to reach collector: {}", e))?;
        let status = response.status();
        debug!("  Response status {}", status);

        match status.as_u16() {
            200..=299 => Ok(()),
            _ if acknowledged => Err(eyre!(
                "Collector did not acknowledge the report: {}",
                status.as_u16()
            )),
            _ => Ok(()),
        }
    }
}

impl ReportSink for HttpReportSink {
    fn send_level(&mut self, level: f64, acknowledged: bool) -> Result<()> {
        let payload = self.level_payload(level, Utc::now())?;
        self.post(LEVEL_ENDPOINT, payload, acknowledged)
    }

    fn send_log(&mut self, message: &str) -> Result<()> {
        let payload = self.log_payload(message, Utc::now())?;
        self.post(LOG_ENDPOINT, payload, false)
    }
}
