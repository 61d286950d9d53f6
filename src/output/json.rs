use serde::Serialize;

use super::{Formatter, PeakOutput, iso8601_timestamp};

#[derive(Serialize)]
struct JsonPeak<'a> {
    ts: String,
    band: usize,
    band_name: &'a str,
    elapsed_ms: u64,
    position: u64,
    bpm: u32,
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, output: &PeakOutput<'_>) -> String {
        let event = output.event;
        let peak = JsonPeak {
            ts: iso8601_timestamp(),
            band: event.band,
            band_name: output.band_name,
            elapsed_ms: event.elapsed_ms,
            position: event.position,
            bpm: event.bpm,
        };
        serde_json::to_string(&peak).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}
