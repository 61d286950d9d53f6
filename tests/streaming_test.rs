use rand::{RngExt, SeedableRng};
use rand_chacha::ChaCha8Rng;

use bandbeat::config::{BeatConfig, ChannelRole};
use bandbeat::signal_processing::SlidingWindowMax;
use bandbeat::simulation::{
    ClickVoice, generate_click_track, generate_impulse_train, interleave_left, random_samples,
    to_stereo_i16,
};
use bandbeat::{Band, BandBank, BandParams, PeakEvent, StreamAnalyzer};

fn click_frames(seconds: f32) -> Vec<i16> {
    let voices = [
        ClickVoice::new(120.0, 1200.0, 0.8),
        ClickVoice::new(90.0, 150.0, 0.6).with_offset_ms(125.0),
    ];
    to_stereo_i16(&generate_click_track(seconds, 44100, &voices))
}

/// Split `total` into random chunk lengths that are multiples of `unit`
fn random_chunk_lengths(total: usize, unit: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut remaining = total;
    while remaining > 0 {
        let len = (rng.random_range(0..512usize) * unit).clamp(unit, remaining);
        lengths.push(len);
        remaining -= len;
    }
    lengths
}

#[test]
fn test_frame_chunking_does_not_change_peaks() {
    let config = BeatConfig::default();
    let frames = click_frames(3.0);

    let mut whole = StreamAnalyzer::new(&config).unwrap();
    let reference = whole.process_frames(&mut frames.clone()).unwrap();
    assert!(!reference.is_empty());

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..3 {
        let mut chunked = StreamAnalyzer::new(&config).unwrap();
        let mut peaks = Vec::new();
        let mut offset = 0;
        for len in random_chunk_lengths(frames.len(), 2, &mut rng) {
            let mut chunk = frames[offset..offset + len].to_vec();
            peaks.extend(chunked.process_frames(&mut chunk).unwrap());
            offset += len;
        }

        assert_eq!(peaks, reference);
        assert_eq!(chunked.frames_processed(), whole.frames_processed());
        assert_eq!(chunked.bank().next_index(), whole.bank().next_index());
        for (a, b) in chunked.bank().bands().iter().zip(whole.bank().bands()) {
            assert_eq!(a.state(), b.state(), "band '{}'", a.name());
            assert_eq!(a.window_max(), b.window_max());
            assert_eq!(a.last_filtered(), b.last_filtered());
        }
    }
}

#[test]
fn test_byte_packets_match_frames() {
    let config = BeatConfig::default();
    let frames = click_frames(2.0);

    let mut reference_analyzer = StreamAnalyzer::new(&config).unwrap();
    let reference = reference_analyzer.process_frames(&mut frames.clone()).unwrap();

    let bytes: Vec<u8> = frames.iter().flat_map(|s| s.to_le_bytes()).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let mut analyzer = StreamAnalyzer::new(&config).unwrap();
    let mut peaks = Vec::new();
    let mut offset = 0;
    for len in random_chunk_lengths(bytes.len(), 4, &mut rng) {
        let mut packet = bytes[offset..offset + len].to_vec();
        peaks.extend(analyzer.process_bytes(&mut packet).unwrap());
        // Without pass-through the packet is left as it was.
        assert_eq!(packet, bytes[offset..offset + len]);
        offset += len;
    }

    assert_eq!(peaks, reference);
}

#[test]
fn test_right_channel_selection() {
    let mut config = BeatConfig::default();
    config.audio.analysis_channel = ChannelRole::Right;

    // Clicks only on the left channel.
    let left: Vec<i16> = click_frames(2.0).iter().step_by(2).copied().collect();
    let mut frames = interleave_left(&left);

    let mut analyzer = StreamAnalyzer::new(&config).unwrap();
    assert!(analyzer.process_frames(&mut frames).unwrap().is_empty());
}

#[test]
fn test_debounce_holds_on_random_input() {
    let params = BandParams {
        sample_rate: 8000,
        sensitivity: 0.5,
        min_threshold: 0.0,
        window_samples: 200,
        min_peak_distance: 50,
    };
    let bands = vec![
        Band::with_taps("raw", vec![1.0], &params).unwrap(),
        Band::with_taps("smooth", vec![0.25, 0.5, 0.25], &params).unwrap(),
    ];
    let mut bank = BandBank::from_bands(8000, bands).unwrap();

    let samples = random_samples(40000, 20000, 99);
    let mut last_peak: [Option<u64>; 2] = [None, None];
    let mut peaks_so_far = [0u64; 2];
    let mut total = 0;

    for (index, &sample) in samples.iter().enumerate() {
        let index = index as u64;
        for event in bank.process_sample(sample as i32, index).unwrap() {
            if let Some(prev) = last_peak[event.band] {
                assert!(
                    index - prev > 51,
                    "band {} peaks at {} and {}",
                    event.band,
                    prev,
                    index
                );
            }
            // Position advances on every sample except peaks.
            assert_eq!(event.position, index - peaks_so_far[event.band]);
            last_peak[event.band] = Some(index);
            peaks_so_far[event.band] += 1;
            total += 1;
        }
    }

    assert!(total > 10, "random input should produce peaks");
}

#[test]
fn test_sliding_max_matches_naive_window() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    for _ in 0..20 {
        let window = rng.random_range(1..64usize);
        let len = rng.random_range(1..500usize);
        let values: Vec<i32> = (0..len).map(|_| rng.random_range(-30000..30000)).collect();

        let mut max = SlidingWindowMax::new(window);
        for (i, &v) in values.iter().enumerate() {
            let got = max.push(v, i as u64);
            let start = (i + 1).saturating_sub(window);
            let expected = values[start..=i].iter().copied().max().unwrap();
            assert_eq!(got, expected, "window {} index {}", window, i);
            assert!(max.len() <= window);
        }
    }
}

#[test]
fn test_sliding_max_with_index_gaps() {
    let mut max = SlidingWindowMax::new(10);
    max.push(500, 0);
    max.push(100, 5);
    assert_eq!(max.push(50, 9), 500);
    // Index 10 drops index 0 from the window.
    assert_eq!(max.push(50, 10), 100);
    assert_eq!(max.push(-5, 30), -5);
}

#[test]
fn test_wav_round_trip_gives_same_peaks() {
    use bandbeat::audio::{AudioSource, WavFileSource};

    let config = BeatConfig::default();
    let frames = click_frames(2.0);

    let path = std::env::temp_dir().join(format!("bandbeat_roundtrip_{}.wav", std::process::id()));
    bandbeat::save_wav(path.to_str().unwrap(), &frames, 44100).unwrap();

    let mut source = WavFileSource::new(&path, 1024).unwrap();
    assert_eq!(source.sample_rate(), 44100);

    let mut analyzer = StreamAnalyzer::new(&config).unwrap();
    let mut peaks: Vec<PeakEvent> = Vec::new();
    while let Some(mut chunk) = source.next_buffer().unwrap() {
        peaks.extend(analyzer.process_frames(&mut chunk).unwrap());
    }
    std::fs::remove_file(&path).ok();

    let mut reference = StreamAnalyzer::new(&config).unwrap();
    assert_eq!(peaks, reference.process_frames(&mut frames.clone()).unwrap());
}

#[test]
fn test_passthrough_emits_filtered_band() {
    let mut config = BeatConfig::default();
    config.detector.debug_band = Some(1);

    let left = generate_impulse_train(4000, 1000, 20000, 10);
    let mut frames = interleave_left(&left);

    let mut analyzer = StreamAnalyzer::new(&config).unwrap();
    analyzer.process_frames(&mut frames).unwrap();

    let taps = analyzer.bank().band(1).unwrap().filter().taps().to_vec();
    // The impulse response of the band appears right after the impulse.
    for (k, &tap) in taps.iter().enumerate() {
        let expected = (20000.0 * tap).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        assert_eq!(frames[2 * (10 + k)], expected);
    }
    // Silent right channel stays silent through the filter.
    assert!(frames.iter().skip(1).step_by(2).all(|&s| s == 0));
}
