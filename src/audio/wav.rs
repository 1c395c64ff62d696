use crate::{MurmurError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

/// Spec used for all journal recordings: 16-bit PCM
pub fn recording_spec(sample_rate: u32, channels: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Write f32 samples (-1.0..1.0) to a 16-bit PCM WAV file
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<()> {
    let mut writer = WavWriter::create(path.as_ref(), recording_spec(sample_rate, channels))
        .map_err(|e| MurmurError::IOError(format!("Failed to create WAV writer: {}", e)))?;

    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| MurmurError::IOError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| MurmurError::IOError(format!("Failed to finalize WAV file: {}", e)))?;

    debug!(
        "Wrote {} samples to {:?}",
        samples.len(),
        path.as_ref()
    );
    Ok(())
}

/// Read a WAV file into f32 samples. Returns (samples, rate, channels).
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader = WavReader::open(path.as_ref())
        .map_err(|e| MurmurError::IOError(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    debug!(
        "Reading WAV: {} Hz, {} ch, {} bit",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    let samples: Result<Vec<f32>> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map_err(|e| MurmurError::IOError(format!("Failed to read sample: {}", e))))
            .collect(),
        SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|s| {
                    s.map(|v| v as f32 / i16::MAX as f32)
                        .map_err(|e| MurmurError::IOError(format!("Failed to read sample: {}", e)))
                })
                .collect(),
            24 => reader
                .samples::<i32>()
                .map(|s| {
                    s.map(|v| v as f32 / 8388608.0)
                        .map_err(|e| MurmurError::IOError(format!("Failed to read sample: {}", e)))
                })
                .collect(),
            32 => reader
                .samples::<i32>()
                .map(|s| {
                    s.map(|v| v as f32 / i32::MAX as f32)
                        .map_err(|e| MurmurError::IOError(format!("Failed to read sample: {}", e)))
                })
                .collect(),
            other => {
                return Err(MurmurError::AudioProcessingError(format!(
                    "Unsupported bit depth: {}",
                    other
                )))
            }
        },
    };

    Ok((samples?, spec.sample_rate, spec.channels))
}

/// Duration of a WAV file in seconds, read from the header only
pub fn wav_duration_seconds<P: AsRef<Path>>(path: P) -> Result<f64> {
    let reader = WavReader::open(path.as_ref())
        .map_err(|e| MurmurError::IOError(format!("Failed to open WAV file: {}", e)))?;
    let spec = reader.spec();
    let frames = reader.duration() as f64;
    Ok(frames / spec.sample_rate as f64)
}

/// Downmix interleaved stereo to mono by averaging each frame
pub fn stereo_to_mono(samples: &[f32]) -> Vec<f32> {
    samples
        .chunks(2)
        .map(|frame| {
            if frame.len() == 2 {
                (frame[0] + frame[1]) / 2.0
            } else {
                frame[0]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn temp_wav(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("murmur_wav_{}_{}.wav", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_write_read_roundtrip() {
        let path = temp_wav("roundtrip");
        let sample_rate = 16000;
        let samples: Vec<f32> = (0..sample_rate as usize)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect();

        write_wav(&path, &samples, sample_rate, 1).unwrap();
        let (read_samples, rate, channels) = read_wav(&path).unwrap();
        assert_eq!(rate, sample_rate);
        assert_eq!(channels, 1);
        assert_eq!(read_samples.len(), samples.len());

        // i16 quantization loses a little precision
        for (a, b) in samples.iter().zip(read_samples.iter()) {
            assert!((a - b).abs() < 0.001);
        }

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_duration_from_header() {
        let path = temp_wav("duration");
        let samples = vec![0.0f32; 8000];
        write_wav(&path, &samples, 16000, 1).unwrap();

        let duration = wav_duration_seconds(&path).unwrap();
        assert!((duration - 0.5).abs() < 1e-6);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_stereo_to_mono() {
        let stereo = vec![0.5, 0.3, 0.7, 0.1];
        let mono = stereo_to_mono(&stereo);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.4).abs() < 0.001);
        assert!((mono[1] - 0.4).abs() < 0.001);
    }
}
