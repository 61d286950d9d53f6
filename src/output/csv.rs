use super::{Formatter, PeakOutput, iso8601_timestamp};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, output: &PeakOutput<'_>) -> String {
        let event = output.event;
        format!(
            "{},{},{},{},{},{}",
            iso8601_timestamp(),
            event.band,
            output.band_name,
            event.elapsed_ms,
            event.position,
            event.bpm
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,band,band_name,elapsed_ms,position,bpm")
    }
}
