//! Sample conditioning between capture and the recognizer.

use crate::audio::resampler::resample_mono;
use crate::audio::RECOGNIZER_SAMPLE_RATE;
use crate::Result;
use tracing::debug;

/// Peak-normalize samples to just under full scale
pub fn normalize_peak(samples: &[f32]) -> Vec<f32> {
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if peak == 0.0 || peak.is_nan() {
        return samples.to_vec();
    }

    let gain = 0.95 / peak;
    samples.iter().map(|&s| s * gain).collect()
}

/// Remove DC offset by subtracting the mean
pub fn remove_dc_offset(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mean: f32 = samples.iter().sum::<f32>() / samples.len() as f32;
    samples.iter().map(|&s| s - mean).collect()
}

/// Condition captured mono audio for the recognizer and VAD: DC
/// removal, resample to 16 kHz, peak normalization.
pub fn prepare_for_recognizer(input: &[f32], input_sample_rate: u32) -> Result<Vec<f32>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let no_dc = remove_dc_offset(input);

    let resampled = if input_sample_rate != RECOGNIZER_SAMPLE_RATE {
        resample_mono(&no_dc, input_sample_rate, RECOGNIZER_SAMPLE_RATE)?
    } else {
        no_dc
    };

    let normalized = normalize_peak(&resampled);

    debug!(
        "Prepared {} samples ({} Hz) -> {} samples (16 kHz)",
        input.len(),
        input_sample_rate,
        normalized.len()
    );

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_peak() {
        let input = vec![0.5, -0.3, 0.8, -0.2];
        let output = normalize_peak(&input);
        let peak = output.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        assert!((peak - 0.95).abs() < 0.01);
    }

    #[test]
    fn test_normalize_silence_unchanged() {
        let input = vec![0.0f32; 16];
        assert_eq!(normalize_peak(&input), input);
    }

    #[test]
    fn test_remove_dc_offset() {
        let input = vec![1.0, 1.1, 0.9, 1.0];
        let output = remove_dc_offset(&input);
        let mean: f32 = output.iter().sum::<f32>() / output.len() as f32;
        assert!(mean.abs() < 0.0001);
    }

    #[test]
    fn test_prepare_passthrough_rate() {
        let input: Vec<f32> = (0..1600).map(|i| (i as f32 * 0.02).sin() * 0.4).collect();
        let output = prepare_for_recognizer(&input, 16000).unwrap();
        assert_eq!(output.len(), input.len());
    }

    #[test]
    fn test_prepare_resamples() {
        let input: Vec<f32> = (0..4800).map(|i| (i as f32 * 0.02).sin() * 0.4).collect();
        let output = prepare_for_recognizer(&input, 48000).unwrap();
        assert!(output.len() < input.len());
    }
}
