//! Crate-wide configuration.

use crate::{MurmurError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for the capture session and storage layout.
///
/// Loaded from `config.toml` in the data directory when present;
/// defaults are usable out of the box.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MurmurConfig {
    /// Root directory for recordings, the transcript store, and
    /// calibration state
    pub data_dir: PathBuf,

    /// Speech probability cutoff for the VAD
    pub vad_threshold: f32,

    /// Seconds of trailing silence before a speech segment is
    /// considered finished
    pub speech_hold_seconds: f32,

    /// Whether to stream captured audio to a WAV recording
    pub write_recordings: bool,
}

impl Default for MurmurConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            vad_threshold: 0.5,
            speech_hold_seconds: 0.5,
            write_recordings: true,
        }
    }
}

/// Platform data directory, falling back to the working directory
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("murmur")
}

impl MurmurConfig {
    /// Load from a TOML file, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        toml::from_str(&data)
            .map_err(|e| MurmurError::ConfigError(format!("Failed to parse {:?}: {}", path, e)))
    }

    /// Load from `config.toml` in the default data directory
    pub fn load_default() -> Result<Self> {
        Self::load(&default_data_dir().join("config.toml"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = toml::to_string_pretty(self)
            .map_err(|e| MurmurError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_vad_threshold(mut self, threshold: f32) -> Self {
        self.vad_threshold = threshold;
        self
    }

    /// Disable WAV output (transcript-only sessions)
    pub fn without_recordings(mut self) -> Self {
        self.write_recordings = false;
        self
    }

    /// Path of the transcript store file
    pub fn transcript_store_path(&self) -> PathBuf {
        self.data_dir.join("transcripts.json")
    }

    /// Path of the persisted calibration state
    pub fn calibration_path(&self) -> PathBuf {
        self.data_dir.join("calibration.json")
    }

    /// Directory recordings are written to
    pub fn recordings_dir(&self) -> PathBuf {
        self.data_dir.join("recordings")
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.vad_threshold) {
            return Err(MurmurError::ConfigError(format!(
                "vad_threshold must be in [0, 1], got {}",
                self.vad_threshold
            )));
        }
        if self.speech_hold_seconds < 0.0 {
            return Err(MurmurError::ConfigError(
                "speech_hold_seconds must not be negative".into(),
            ));
        }
        Ok(())
    }
}
