//! Audio level metering and background-noise calibration.

pub mod calibration;

pub use calibration::{CalibrationState, CalibratorParams, NoiseCalibrator};

/// Silence floor in dBFS; anything at or below maps to 0.0
pub const MIN_DB: f32 = -80.0;
/// Full scale
pub const MAX_DB: f32 = 0.0;

/// Root mean square of a sample chunk
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Convert a linear amplitude to dBFS, with a floor for silence
pub fn amplitude_to_db(amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        return MIN_DB;
    }
    (20.0 * amplitude.log10()).max(MIN_DB)
}

/// RMS level of a sample chunk in dBFS
pub fn rms_db(samples: &[f32]) -> f32 {
    amplitude_to_db(rms(samples))
}

/// Normalize a dBFS level into [0, 1] for display and calibration.
///
/// Clamps into [-80, 0] dB first, matching the meter range the rest of
/// the pipeline assumes.
pub fn normalize_db(db: f32) -> f64 {
    let clamped = db.clamp(MIN_DB, MAX_DB);
    ((clamped - MIN_DB) / (MAX_DB - MIN_DB)) as f64
}

/// Normalized [0, 1] level of a sample chunk
pub fn normalized_level(samples: &[f32]) -> f64 {
    normalize_db(rms_db(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_silence() {
        assert_eq!(rms(&[0.0; 128]), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_of_constant() {
        let samples = vec![0.5f32; 256];
        assert!((rms(&samples) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_db_floor() {
        assert_eq!(amplitude_to_db(0.0), MIN_DB);
        assert_eq!(amplitude_to_db(-1.0), MIN_DB);
        // Well below the floor still clamps
        assert_eq!(amplitude_to_db(1e-9), MIN_DB);
    }

    #[test]
    fn test_full_scale_is_zero_db() {
        assert!(amplitude_to_db(1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_db(MIN_DB), 0.0);
        assert_eq!(normalize_db(MAX_DB), 1.0);
        assert_eq!(normalize_db(-120.0), 0.0);
        assert_eq!(normalize_db(10.0), 1.0);
        assert!((normalize_db(-40.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_level_of_sine() {
        let samples: Vec<f32> = (0..1024)
            .map(|i| (i as f32 * 0.1).sin() * 0.5)
            .collect();
        let level = normalized_level(&samples);
        assert!(level > 0.5 && level < 1.0);
    }
}
