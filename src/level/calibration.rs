use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Tunables for background-noise tracking
#[derive(Debug, Clone)]
pub struct CalibratorParams {
    /// EMA weight given to the stored baseline
    pub ema_alpha: f64,
    /// Minimum EMA movement before the baseline is replaced
    pub noise_change_threshold: f64,
    /// Normalized level treated as a spike
    pub spike_level_threshold: f64,
    /// How long a spike must persist before recalibration
    pub spike_duration: Duration,
    /// Fraction of the baseline subtracted from live levels
    pub adjustment_alpha: f64,
    /// Non-speech samples required before the first baseline is set
    pub min_bootstrap_samples: usize,
}

impl Default for CalibratorParams {
    fn default() -> Self {
        Self {
            ema_alpha: 0.1,
            noise_change_threshold: 0.05,
            spike_level_threshold: 0.3,
            spike_duration: Duration::from_secs(5),
            adjustment_alpha: 0.3,
            min_bootstrap_samples: 10,
        }
    }
}

/// The persisted part of the calibrator: survives restarts so the app
/// does not re-learn ambient noise on every launch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationState {
    pub baseline: f64,
    pub calibrated: bool,
}

/// Exponential-moving-average estimate of ambient audio level.
///
/// While no speech is detected, normalized levels are collected; the
/// first baseline is their arithmetic mean. Once calibrated the
/// baseline follows an EMA, updated only when it drifts past a change
/// threshold, and a sustained loud spike forces a collection reset.
/// Live levels are reported with a fraction of the baseline subtracted
/// so quiet rooms and noisy rooms meter comparably.
pub struct NoiseCalibrator {
    params: CalibratorParams,
    state: CalibrationState,
    state_path: Option<PathBuf>,
    bootstrap_levels: Vec<f64>,
    spike_start: Option<Instant>,
    speech_detected: bool,
    current_level: f64,
}

impl NoiseCalibrator {
    pub fn new(params: CalibratorParams) -> Self {
        Self {
            params,
            state: CalibrationState::default(),
            state_path: None,
            bootstrap_levels: Vec::new(),
            spike_start: None,
            speech_detected: false,
            current_level: 0.0,
        }
    }

    /// Create a calibrator that persists its state to `path`, loading
    /// any previously saved baseline.
    pub fn with_state_file(params: CalibratorParams, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut calibrator = Self::new(params);

        if path.exists() {
            let data = fs::read_to_string(&path)?;
            calibrator.state = serde_json::from_str(&data)?;
            if calibrator.state.calibrated {
                info!(
                    "Loaded persisted background noise baseline: {:.4}",
                    calibrator.state.baseline
                );
            }
        } else {
            debug!("No calibration state at {:?}, starting uncalibrated", path);
        }

        calibrator.state_path = Some(path);
        Ok(calibrator)
    }

    pub fn is_calibrated(&self) -> bool {
        self.state.calibrated
    }

    pub fn baseline(&self) -> f64 {
        self.state.baseline
    }

    /// The most recent baseline-adjusted level
    pub fn current_level(&self) -> f64 {
        self.current_level
    }

    /// Report whether speech is currently detected. Entering speech
    /// discards in-flight noise collection so voiced audio never
    /// pollutes the baseline; the stored baseline is kept.
    pub fn set_speech_detected(&mut self, detected: bool) {
        if detected && !self.speech_detected {
            self.reset_collection();
            debug!("Background noise collection reset due to speech");
        }
        self.speech_detected = detected;
    }

    /// Feed one normalized [0, 1] level reading and get back the
    /// baseline-adjusted level for display.
    pub fn handle_level(&mut self, normalized: f64) -> Result<f64> {
        if !self.speech_detected {
            if !self.state.calibrated {
                self.bootstrap_levels.push(normalized);
                if self.bootstrap_levels.len() >= self.params.min_bootstrap_samples {
                    let mean = self.bootstrap_levels.iter().sum::<f64>()
                        / self.bootstrap_levels.len() as f64;
                    self.update_baseline(mean)?;
                }
            } else {
                self.update_ema(normalized)?;
                self.detect_spike(normalized);
            }
        }

        self.current_level = self.adjust(normalized);
        Ok(self.current_level)
    }

    fn update_baseline(&mut self, baseline: f64) -> Result<()> {
        self.state.baseline = baseline;
        self.state.calibrated = true;
        self.spike_start = None;
        self.bootstrap_levels.clear();
        info!("Background noise baseline updated: {:.4}", baseline);
        self.persist()
    }

    fn update_ema(&mut self, normalized: f64) -> Result<()> {
        let ema = self.params.ema_alpha * self.state.baseline
            + (1.0 - self.params.ema_alpha) * normalized;
        if (ema - self.state.baseline).abs() > self.params.noise_change_threshold {
            self.update_baseline(ema)?;
        }
        Ok(())
    }

    fn detect_spike(&mut self, normalized: f64) {
        if normalized > self.params.spike_level_threshold {
            match self.spike_start {
                None => {
                    self.spike_start = Some(Instant::now());
                    debug!("Noise spike started");
                }
                Some(start) if start.elapsed() > self.params.spike_duration => {
                    info!(
                        "Noise spike sustained for {:?}, resetting noise collection",
                        self.params.spike_duration
                    );
                    self.reset_collection();
                }
                Some(_) => {}
            }
        } else {
            self.spike_start = None;
        }
    }

    fn reset_collection(&mut self) {
        self.bootstrap_levels.clear();
        self.spike_start = None;
    }

    /// Subtract a fraction of the learned baseline and rescale so a
    /// full-scale input still maps to 1.0.
    fn adjust(&self, normalized: f64) -> f64 {
        if self.state.calibrated && self.state.baseline > 0.0 {
            let alpha = self.params.adjustment_alpha;
            let floor = alpha * self.state.baseline;
            (normalized - floor).max(0.0) / (1.0 - floor)
        } else {
            normalized
        }
    }

    fn persist(&self) -> Result<()> {
        if let Some(path) = &self.state_path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&self.state)?)?;
        }
        Ok(())
    }

    /// Forget the baseline entirely and delete any persisted state
    pub fn reset(&mut self) -> Result<()> {
        self.state = CalibrationState::default();
        self.reset_collection();
        self.current_level = 0.0;
        if let Some(path) = &self.state_path {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        info!("Background noise calibration reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_params() -> CalibratorParams {
        CalibratorParams {
            min_bootstrap_samples: 4,
            spike_duration: Duration::from_millis(5),
            ..CalibratorParams::default()
        }
    }

    #[test]
    fn test_bootstrap_mean_becomes_baseline() {
        let mut cal = NoiseCalibrator::new(quick_params());
        for level in [0.10, 0.12, 0.08, 0.10] {
            cal.handle_level(level).unwrap();
        }
        assert!(cal.is_calibrated());
        assert!((cal.baseline() - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_uncalibrated_passes_raw_level() {
        let mut cal = NoiseCalibrator::new(quick_params());
        let adjusted = cal.handle_level(0.42).unwrap();
        assert!((adjusted - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_adjustment_formula() {
        let mut cal = NoiseCalibrator::new(quick_params());
        for _ in 0..4 {
            cal.handle_level(0.2).unwrap();
        }
        assert!(cal.is_calibrated());

        let adjusted = cal.handle_level(0.2).unwrap();
        // floor = 0.3 * 0.2 = 0.06; (0.2 - 0.06) / (1 - 0.06)
        let expected = (0.2 - 0.06) / 0.94;
        assert!((adjusted - expected).abs() < 1e-6);

        // Quieter than the noise floor clamps to zero
        assert_eq!(cal.handle_level(0.01).unwrap(), 0.0);
    }

    #[test]
    fn test_ema_updates_only_past_threshold() {
        let mut cal = NoiseCalibrator::new(quick_params());
        for _ in 0..4 {
            cal.handle_level(0.1).unwrap();
        }
        let before = cal.baseline();

        // Tiny drift: EMA moves less than the 0.05 change threshold
        cal.handle_level(0.12).unwrap();
        assert_eq!(cal.baseline(), before);

        // Large sustained change: (0.1*0.1 + 0.9*0.25) = 0.235, delta > 0.05
        cal.handle_level(0.25).unwrap();
        assert!(cal.baseline() > before);
    }

    #[test]
    fn test_speech_pauses_bootstrap() {
        let mut cal = NoiseCalibrator::new(quick_params());
        cal.handle_level(0.1).unwrap();
        cal.handle_level(0.1).unwrap();

        cal.set_speech_detected(true);
        for _ in 0..10 {
            // Loud speech must not enter the baseline
            cal.handle_level(0.9).unwrap();
        }
        assert!(!cal.is_calibrated());

        cal.set_speech_detected(false);
        for _ in 0..4 {
            cal.handle_level(0.1).unwrap();
        }
        assert!(cal.is_calibrated());
        assert!((cal.baseline() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_sustained_spike_resets_collection() {
        let mut cal = NoiseCalibrator::new(quick_params());
        for _ in 0..4 {
            cal.handle_level(0.1).unwrap();
        }

        cal.handle_level(0.5).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        cal.handle_level(0.5).unwrap();
        // Baseline survives the reset; only in-flight collection clears
        assert!(cal.is_calibrated());
    }

    #[test]
    fn test_state_persistence() {
        let path = std::env::temp_dir().join(format!(
            "murmur_calibration_{}.json",
            uuid::Uuid::new_v4()
        ));

        {
            let mut cal =
                NoiseCalibrator::with_state_file(quick_params(), &path).unwrap();
            for _ in 0..4 {
                cal.handle_level(0.15).unwrap();
            }
            assert!(cal.is_calibrated());
        }

        let reloaded = NoiseCalibrator::with_state_file(quick_params(), &path).unwrap();
        assert!(reloaded.is_calibrated());
        assert!((reloaded.baseline() - 0.15).abs() < 1e-9);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_reset_clears_persisted_state() {
        let path = std::env::temp_dir().join(format!(
            "murmur_calibration_reset_{}.json",
            uuid::Uuid::new_v4()
        ));

        let mut cal = NoiseCalibrator::with_state_file(quick_params(), &path).unwrap();
        for _ in 0..4 {
            cal.handle_level(0.15).unwrap();
        }
        cal.reset().unwrap();
        assert!(!cal.is_calibrated());
        assert!(!path.exists());
    }
}
