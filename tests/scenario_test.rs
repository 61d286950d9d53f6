use bandbeat::simulation::generate_impulse_train;
use bandbeat::{Band, BandBank, BandParams, PeakEvent};

const SAMPLE_RATE: u32 = 44100;
const IMPULSE: i16 = 30000;

/// Single all-pass band as used in the impulse-train scenarios
fn all_pass_bank(min_peak_distance: u32, min_threshold: f64) -> BandBank {
    let params = BandParams {
        sample_rate: SAMPLE_RATE,
        sensitivity: 1.0,
        min_threshold,
        window_samples: (1.5 * SAMPLE_RATE as f64) as usize,
        min_peak_distance,
    };
    let band = Band::with_taps("all-pass", vec![1.0], &params).unwrap();
    BandBank::from_bands(SAMPLE_RATE, vec![band]).unwrap()
}

fn run(bank: &mut BandBank, samples: &[i16]) -> Vec<(u64, PeakEvent)> {
    let mut peaks = Vec::new();
    for (index, &sample) in samples.iter().enumerate() {
        for event in bank.process_sample(sample as i32, index as u64).unwrap() {
            peaks.push((index as u64, event));
        }
    }
    peaks
}

#[test]
fn test_impulse_every_100ms_reports_600_bpm() {
    let mut bank = all_pass_bank(0, 0.0);
    let signal = generate_impulse_train(SAMPLE_RATE as usize * 2, 4410, IMPULSE, 0);

    let peaks = run(&mut bank, &signal);

    assert_eq!(peaks.len(), 20, "one peak per impulse");
    for (k, (index, event)) in peaks.iter().enumerate() {
        assert_eq!(*index, k as u64 * 4410);
        // The position counter skips peak samples.
        assert_eq!(event.position, k as u64 * 4409);
    }

    // Nothing precedes the first peak to measure a period against.
    assert_eq!(peaks[0].1.bpm, 0);
    for (_, event) in &peaks[1..] {
        assert_eq!(event.bpm, 600);
    }
    assert_eq!(bank.bpms(), vec![600]);
}

#[test]
fn test_debounce_suppresses_close_impulses() {
    let mut bank = all_pass_bank(8820, 0.0);
    let signal = generate_impulse_train(SAMPLE_RATE as usize * 2, 4410, IMPULSE, 0);

    let peaks = run(&mut bank, &signal);
    let indices: Vec<u64> = peaks.iter().map(|(i, _)| *i).collect();

    // Strictly more than 8820 samples must separate peaks; the counter at
    // the second impulse is 8819, so every third impulse fires.
    assert_eq!(indices, vec![0, 13230, 26460, 39690, 52920, 66150, 79380]);
    for (_, event) in &peaks[1..] {
        assert_eq!(event.bpm, 200);
    }
}

#[test]
fn test_debounce_never_lets_faster_than_cap() {
    let mut bank = all_pass_bank(8820, 0.0);
    let signal = generate_impulse_train(SAMPLE_RATE as usize * 4, 4410, IMPULSE, 0);

    let peaks = run(&mut bank, &signal);
    for pair in peaks.windows(2) {
        assert!(pair[1].0 - pair[0].0 > 8820);
        assert!(pair[1].1.bpm <= 300);
    }
}

#[test]
fn test_silence_with_floor_never_peaks() {
    let mut bank = all_pass_bank(0, 1638.0);
    let signal = vec![0i16; SAMPLE_RATE as usize];

    assert!(run(&mut bank, &signal).is_empty());
    assert_eq!(bank.bpms(), vec![0]);
    assert_eq!(bank.band(0).unwrap().state().position, SAMPLE_RATE as u64);
}

#[test]
fn test_silence_without_floor_fires_once() {
    // A zero threshold accepts the first silent sample, after which the
    // debounce distance holds further peaks back.
    let mut bank = all_pass_bank(SAMPLE_RATE, 0.0);
    let signal = vec![0i16; SAMPLE_RATE as usize];

    let peaks = run(&mut bank, &signal);
    assert_eq!(peaks.len(), 1);
    assert_eq!(peaks[0].0, 0);
}

#[test]
fn test_impulses_below_floor_are_ignored() {
    let mut bank = all_pass_bank(0, 1638.0);
    let signal = generate_impulse_train(SAMPLE_RATE as usize, 4410, 1000, 0);
    assert!(run(&mut bank, &signal).is_empty());
}

#[test]
fn test_negative_impulses_do_not_register() {
    let mut bank = all_pass_bank(0, 100.0);
    let signal = generate_impulse_train(SAMPLE_RATE as usize, 4410, -IMPULSE, 0);
    assert!(run(&mut bank, &signal).is_empty());
}

#[test]
fn test_bpm_of_120_bpm_impulse_train() {
    let mut bank = all_pass_bank(8820, 1638.0);
    // 120 BPM is one impulse every 22050 samples, offset into the stream.
    let signal = generate_impulse_train(SAMPLE_RATE as usize * 5, 22050, IMPULSE, 1000);

    let peaks = run(&mut bank, &signal);
    assert_eq!(peaks.len(), 10);
    assert!(peaks[1..].iter().all(|(_, e)| e.bpm == 120));
}

#[test]
fn test_elapsed_ms_follows_position() {
    let mut bank = all_pass_bank(0, 0.0);
    let signal = generate_impulse_train(SAMPLE_RATE as usize, 4410, IMPULSE, 0);

    let peaks = run(&mut bank, &signal);
    for (_, event) in &peaks {
        let expected = (event.position as f64 / 44.1).round() as u64;
        assert_eq!(event.elapsed_ms, expected);
    }
    // Third peak: position 8818 is 199.95 ms.
    assert_eq!(peaks[2].1.elapsed_ms, 200);
}
