use crate::audio::wav::recording_spec;
use crate::{MurmurError, Result};
use chrono::Utc;
use hound::WavWriter;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Streams captured samples into a journal recording on disk.
///
/// Files are named `recording_<unix-ts>.wav` so they sort
/// chronologically and the transcript entry can key off the path.
pub struct RecordingWriter {
    writer: Option<WavWriter<BufWriter<File>>>,
    path: PathBuf,
    sample_rate: u32,
    samples_written: u64,
}

impl RecordingWriter {
    /// Start a new recording in `dir` at the given mono sample rate
    pub fn create(dir: &Path, sample_rate: u32) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("recording_{}.wav", Utc::now().timestamp_millis()));

        let writer = WavWriter::create(&path, recording_spec(sample_rate, 1))
            .map_err(|e| MurmurError::IOError(format!("Failed to create recording: {}", e)))?;

        info!("Recording to {:?}", path);

        Ok(Self {
            writer: Some(writer),
            path,
            sample_rate,
            samples_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seconds of audio written so far
    pub fn elapsed_seconds(&self) -> f64 {
        self.samples_written as f64 / self.sample_rate as f64
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Append a chunk of mono f32 samples
    pub fn write(&mut self, samples: &[f32]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| MurmurError::IOError("Recording already finalized".into()))?;

        for &sample in samples {
            let v = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(v)
                .map_err(|e| MurmurError::IOError(format!("Failed to write sample: {}", e)))?;
        }
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    /// Flush and close the file, returning its path
    pub fn finalize(mut self) -> Result<PathBuf> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| MurmurError::IOError(format!("Failed to finalize recording: {}", e)))?;
        }
        info!(
            "Finalized recording {:?} ({:.1}s)",
            self.path,
            self.elapsed_seconds()
        );
        Ok(self.path)
    }
}
