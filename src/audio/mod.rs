pub mod buffer;
#[cfg(feature = "audio-io")]
pub mod input;
pub mod preprocessor;
pub mod resampler;
pub mod vad;
pub mod wav;

pub use buffer::SampleRingBuffer;
#[cfg(feature = "audio-io")]
pub use input::MicCapture;
pub use preprocessor::prepare_for_recognizer;
pub use resampler::MonoResampler;
pub use vad::SpeechDetector;
pub use wav::{read_wav, wav_duration_seconds, write_wav};

use crate::Result;
use tracing::info;

/// Sample rate the recognizer and VAD operate at
pub const RECOGNIZER_SAMPLE_RATE: u32 = 16000;

/// Smoke test of the offline audio path, used by the binary's
/// `selftest` mode. Exercises everything that does not need a device.
pub fn run_pipeline_check() -> Result<()> {
    info!("Checking sample ring buffer...");
    let buffer = SampleRingBuffer::new(1024);
    let chunk: Vec<f32> = (0..512).map(|i| i as f32 / 512.0).collect();
    buffer.write(&chunk);
    assert_eq!(buffer.read(512).len(), 512);

    info!("Checking WAV round trip...");
    let wav_path = std::env::temp_dir().join("murmur_selftest.wav");
    let tone: Vec<f32> = (0..RECOGNIZER_SAMPLE_RATE as usize)
        .map(|i| {
            (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / RECOGNIZER_SAMPLE_RATE as f32).sin()
                * 0.5
        })
        .collect();
    write_wav(&wav_path, &tone, RECOGNIZER_SAMPLE_RATE, 1)?;
    let (samples, rate, channels) = read_wav(&wav_path)?;
    assert_eq!(rate, RECOGNIZER_SAMPLE_RATE);
    assert_eq!(channels, 1);
    assert_eq!(samples.len(), tone.len());
    std::fs::remove_file(&wav_path).ok();

    info!("Checking resampler...");
    let mut resampler = MonoResampler::new(48000, RECOGNIZER_SAMPLE_RATE)?;
    let input: Vec<f32> = (0..4800).map(|i| (i as f32 * 0.01).sin()).collect();
    let output = resampler.resample(&input)?;
    assert!(!output.is_empty());

    info!("Checking voice activity detector...");
    match SpeechDetector::new(RECOGNIZER_SAMPLE_RATE, 0.5) {
        Ok(mut vad) => {
            let silence = vec![0.0f32; vad.chunk_size()];
            assert!(!vad.is_speech(&silence)?);
        }
        Err(e) => info!("VAD check skipped: {}", e),
    }

    info!("Audio pipeline check passed");
    Ok(())
}
