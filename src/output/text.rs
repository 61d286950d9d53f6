use super::{Formatter, PeakOutput};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &PeakOutput<'_>) -> String {
        let event = output.event;
        let line = format!(
            "Beat [{}] {:>9.3} s {:>4} BPM",
            output.band_name,
            event.elapsed_ms as f64 / 1000.0,
            event.bpm
        );
        if self.verbose {
            format!("{} (band {}, pos {})", line, event.band, event.position)
        } else {
            line
        }
    }
}
