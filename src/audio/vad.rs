use crate::{MurmurError, Result};
use tracing::info;
use voice_activity_detector::VoiceActivityDetector;

/// Silero-based speech detector.
///
/// Gates the noise calibrator (speech must not enter the ambient
/// baseline) and drives the session's speech start/end events.
pub struct SpeechDetector {
    detector: VoiceActivityDetector,
    sample_rate: u32,
    threshold: f32,
}

impl SpeechDetector {
    /// `sample_rate` must be 8000 or 16000; `threshold` is the speech
    /// probability cutoff.
    pub fn new(sample_rate: u32, threshold: f32) -> Result<Self> {
        if ![8000, 16000].contains(&sample_rate) {
            return Err(MurmurError::ConfigError(format!(
                "Invalid VAD sample rate: {}. Must be 8000 or 16000",
                sample_rate
            )));
        }

        let chunk_size = Self::chunk_size_for(sample_rate);

        let detector = VoiceActivityDetector::builder()
            .sample_rate(sample_rate as i32)
            .chunk_size(chunk_size)
            .build()
            .map_err(|e| {
                MurmurError::AudioProcessingError(format!("Failed to create VAD: {:?}", e))
            })?;

        info!(
            "Initialized VAD: {} Hz, threshold {}",
            sample_rate, threshold
        );

        Ok(Self {
            detector,
            sample_rate,
            threshold,
        })
    }

    fn chunk_size_for(sample_rate: u32) -> usize {
        // 32ms frames
        match sample_rate {
            8000 => 256,
            _ => 512,
        }
    }

    /// Whether this chunk contains speech
    pub fn is_speech(&mut self, audio: &[f32]) -> Result<bool> {
        Ok(self.probability(audio)? >= self.threshold)
    }

    /// Speech probability (0.0-1.0) for this chunk
    pub fn probability(&mut self, audio: &[f32]) -> Result<f32> {
        Ok(self.detector.predict(audio.iter().copied()))
    }

    /// Reset session state, e.g. between recordings
    pub fn reset(&mut self) {
        self.detector.reset();
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per detection frame for this configuration
    pub fn chunk_size(&self) -> usize {
        Self::chunk_size_for(self.sample_rate)
    }
}
