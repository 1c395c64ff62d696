use crate::{MurmurError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Fixed chunk size (frames) fed to the sinc resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Sinc resampler for mono audio.
///
/// Capture is downmixed to mono before it reaches this point, so only
/// single-channel conversion is supported. Input is processed in fixed
/// chunks; the final partial chunk is zero-padded and the output
/// trimmed back to the proportional length.
pub struct MonoResampler {
    resampler: SincFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl MonoResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(MurmurError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let resampler = SincFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            2.0,
            params,
            CHUNK_FRAMES,
            1,
        )
        .map_err(|e| {
            MurmurError::AudioProcessingError(format!("Failed to create resampler: {}", e))
        })?;

        debug!("Created resampler: {} Hz -> {} Hz", input_rate, output_rate);

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
        })
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Resample a mono sample buffer
    pub fn resample(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let ratio = self.output_rate as f64 / self.input_rate as f64;
        let mut output = Vec::with_capacity((input.len() as f64 * ratio * 1.1) as usize);

        let mut offset = 0;
        while offset < input.len() {
            let remaining = input.len() - offset;
            let take = remaining.min(CHUNK_FRAMES);

            // SincFixedIn wants exactly CHUNK_FRAMES per call; the last
            // chunk is zero-padded
            let mut chunk = vec![0.0f32; CHUNK_FRAMES];
            chunk[..take].copy_from_slice(&input[offset..offset + take]);

            let processed = self
                .resampler
                .process(&[chunk], None)
                .map_err(|e| {
                    MurmurError::AudioProcessingError(format!("Resampling failed: {}", e))
                })?;

            let produced = processed[0].len();
            let keep = if remaining < CHUNK_FRAMES {
                // Trim the padded tail proportionally
                ((take as f64) * ratio).ceil() as usize
            } else {
                produced
            };
            output.extend_from_slice(&processed[0][..keep.min(produced)]);

            offset += take;
        }

        debug!("Resampled {} -> {} samples", input.len(), output.len());
        Ok(output)
    }

    /// Drop internal filter state, e.g. between recordings
    pub fn reset(&mut self) {
        self.resampler.reset();
    }
}

/// One-shot resampling helper
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }
    let mut resampler = MonoResampler::new(input_rate, output_rate)?;
    resampler.resample(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        assert!(MonoResampler::new(48000, 16000).is_ok());
    }

    #[test]
    fn test_invalid_rates() {
        assert!(MonoResampler::new(0, 16000).is_err());
        assert!(MonoResampler::new(48000, 0).is_err());
    }

    #[test]
    fn test_downsample_length() {
        let mut resampler = MonoResampler::new(48000, 16000).unwrap();
        let input: Vec<f32> = (0..4800).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = resampler.resample(&input).unwrap();
        // 3:1 ratio, allow for filter edge effects
        assert!(output.len() > 1000 && output.len() < 2200);
    }

    #[test]
    fn test_empty_input() {
        let mut resampler = MonoResampler::new(48000, 16000).unwrap();
        assert!(resampler.resample(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_same_rate_passthrough() {
        let input = vec![0.1f32, 0.2, 0.3];
        let output = resample_mono(&input, 16000, 16000).unwrap();
        assert_eq!(output, input);
    }
}
