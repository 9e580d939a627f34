//! Progress ingestion for the model pull event stream.
//!
//! The Brain answers `POST /models/pull` with server-sent units of the form
//! `data: {"status": "...", "pct": 42}` separated by blank lines. Chunks from
//! the wire do not line up with units, so bytes are buffered until a full
//! unit is available.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const UNIT_DELIMITER: &[u8] = b"\n\n";
const DATA_PREFIX: &str = "data: ";

/// Message reported when the stream's last status is `error`.
pub const PULL_FAILED_MESSAGE: &str = "Pull failed";

/// One decoded progress unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub pct: f64,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PullStatus {
    Ok,
    Error,
}

/// Terminal result of one pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullOutcome {
    pub status: PullStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PullOutcome {
    pub fn ok(model: &str) -> Self {
        Self {
            status: PullStatus::Ok,
            model: Some(model.to_string()),
            message: None,
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            status: PullStatus::Error,
            model: None,
            message: Some(message.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == PullStatus::Ok
    }
}

/// Reassembles stream units from raw chunks and tracks the last status seen.
#[derive(Debug, Default)]
pub struct StreamIngester {
    buffer: Vec<u8>,
    last_status: String,
    units_seen: usize,
}

impl StreamIngester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and process every complete unit it finishes.
    ///
    /// `sink` is called synchronously, in arrival order, once per unit that
    /// carries a numeric `pct`. A trailing partial unit stays buffered.
    pub fn feed<F>(&mut self, chunk: &[u8], sink: &mut F)
    where
        F: FnMut(ProgressEvent),
    {
        self.buffer.extend_from_slice(chunk);

        while let Some(end) = find_delimiter(&self.buffer) {
            let unit: Vec<u8> = self.buffer.drain(..end + UNIT_DELIMITER.len()).collect();
            self.ingest_unit(&unit[..end], sink);
        }
    }

    /// Status of the last decoded unit (empty if none carried one).
    pub fn last_status(&self) -> &str {
        &self.last_status
    }

    /// Number of units decoded so far.
    pub fn units_seen(&self) -> usize {
        self.units_seen
    }

    /// Derive the terminal outcome from the last known status.
    ///
    /// Anything other than an explicit `error` counts as success, including a
    /// stream that never reported a status. Bytes still buffered without a
    /// closing delimiter are not decoded.
    pub fn finish(self, model: &str) -> PullOutcome {
        if !self.buffer.is_empty() {
            debug!(
                "Pull stream ended with {} undelimited bytes; ignoring",
                self.buffer.len()
            );
        }

        match self.last_status.as_str() {
            "done" | "success" => PullOutcome::ok(model),
            "error" => PullOutcome::failed(PULL_FAILED_MESSAGE),
            other => {
                debug!(
                    "Pull stream for '{}' ended inconclusively (last status '{}'); reporting ok",
                    model, other
                );
                PullOutcome::ok(model)
            }
        }
    }

    fn ingest_unit<F>(&mut self, raw: &[u8], sink: &mut F)
    where
        F: FnMut(ProgressEvent),
    {
        let text = String::from_utf8_lossy(raw);

        for line in text.trim().lines() {
            let Some(payload) = line.trim_end_matches('\r').strip_prefix(DATA_PREFIX) else {
                continue;
            };

            let value: Value = match serde_json::from_str(payload) {
                Ok(value) => value,
                Err(e) => {
                    debug!("Skipping undecodable pull unit: {}", e);
                    continue;
                }
            };

            self.units_seen += 1;
            let status = value
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            self.last_status.clone_from(&status);

            if let Some(pct) = value.get("pct").and_then(Value::as_f64) {
                sink(ProgressEvent { pct, status });
            }
        }
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(UNIT_DELIMITER.len())
        .position(|window| window == UNIT_DELIMITER)
}
