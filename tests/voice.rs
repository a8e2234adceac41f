//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use lami::voice::{DetectorState, SAMPLE_RATE, SpeechDetector, rms, samples_to_wav};
use std::io::Cursor;

/// Generate sine wave audio samples
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

#[test]
fn test_detector_creation() {
    let detector = SpeechDetector::default();

    assert_eq!(detector.state(), DetectorState::Idle);
    assert!(!detector.is_speaking());
    assert!(!detector.is_segment_complete());
    assert!(detector.segment().is_empty());
}

#[test]
fn test_speech_activity_detection() {
    let mut detector = SpeechDetector::default();

    // Silent samples - should not trigger
    let silence = generate_silence(0.1);
    assert!(!detector.process(&silence));
    assert_eq!(detector.state(), DetectorState::Idle);

    // Loud samples - should start speaking
    let speech = generate_sine_samples(440.0, 0.5, 0.3);
    detector.process(&speech);
    assert_eq!(detector.state(), DetectorState::Speaking);

    let more_speech = generate_sine_samples(440.0, 0.3, 0.3);
    assert!(!detector.process(&more_speech));

    let silence = generate_silence(0.6);
    assert!(detector.process(&silence));
}

#[test]
fn test_quiet_signal_stays_idle() {
    let mut detector = SpeechDetector::default();

    let murmur = generate_sine_samples(440.0, 0.5, 0.01);
    assert!(!detector.process(&murmur));
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_custom_threshold() {
    let mut detector = SpeechDetector::new(0.5);

    let speech = generate_sine_samples(440.0, 0.2, 0.3);
    detector.process(&speech);
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_segment_accumulation() {
    let mut detector = SpeechDetector::default();

    let chunk1 = generate_sine_samples(440.0, 0.1, 0.3);
    detector.process(&chunk1);

    let chunk2 = generate_sine_samples(440.0, 0.1, 0.3);
    detector.process(&chunk2);

    assert_eq!(detector.segment().len(), chunk1.len() + chunk2.len());
    assert!((detector.segment_secs() - 0.2).abs() < 0.01);
}

#[test]
fn test_take_segment_resets() {
    let mut detector = SpeechDetector::default();

    let speech = generate_sine_samples(440.0, 0.1, 0.3);
    detector.process(&speech);

    let taken = detector.take_segment();
    assert_eq!(taken.len(), speech.len());

    assert!(detector.segment().is_empty());
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_segment_not_complete_without_silence() {
    let mut detector = SpeechDetector::default();

    let speech = generate_sine_samples(440.0, 0.5, 0.3);
    detector.process(&speech);
    assert!(!detector.is_segment_complete());

    detector.process(&generate_silence(0.6));
    assert!(detector.is_segment_complete());
}

#[test]
fn test_rms() {
    assert!(rms(&[]).abs() < f32::EPSILON);
    assert!(rms(&generate_silence(0.1)).abs() < f32::EPSILON);

    // RMS of a sine wave is amplitude / sqrt(2)
    let sine = generate_sine_samples(440.0, 1.0, 0.5);
    assert!((rms(&sine) - 0.5 / 2.0_f32.sqrt()).abs() < 0.01);
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    assert!(wav_data.len() > 44);
}

#[test]
fn test_wav_roundtrip() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    let cursor = Cursor::new(wav_data);
    let mut reader = hound::WavReader::new(cursor).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
}
