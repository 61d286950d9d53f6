use hound::{WavSpec, WavWriter};

/// Write interleaved stereo 16-bit samples to a WAV file
pub fn save_wav(filename: &str, samples: &[i16], sample_rate: u32) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(filename, spec)?;

    for &sample in samples {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}
