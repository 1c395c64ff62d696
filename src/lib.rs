pub mod audio;
pub mod config;
pub mod diff;
pub mod level;
pub mod recorder;
pub mod session;
pub mod transcript;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MurmurError {
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Transcript error: {0}")]
    TranscriptError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Session error: {0}")]
    SessionError(String),
}

impl From<std::io::Error> for MurmurError {
    fn from(e: std::io::Error) -> Self {
        MurmurError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for MurmurError {
    fn from(e: serde_json::Error) -> Self {
        MurmurError::StorageError(e.to_string())
    }
}

impl MurmurError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Hardware/device errors may require user intervention
            MurmurError::AudioDeviceError(_) => false,
            MurmurError::AudioProcessingError(_) => true,
            MurmurError::TranscriptError(_) => true,
            MurmurError::StorageError(_) => false,
            MurmurError::IOError(_) => false,
            MurmurError::ConfigError(_) => false,
            MurmurError::ChannelError(_) => false,
            MurmurError::SessionError(_) => true,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            MurmurError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone.".to_string()
            }
            MurmurError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            MurmurError::TranscriptError(_) => {
                "Transcript update failed. The recording is unaffected.".to_string()
            }
            MurmurError::StorageError(_) => {
                "Journal storage error. Please check the data directory.".to_string()
            }
            MurmurError::IOError(_) => "File system error occurred.".to_string(),
            MurmurError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            MurmurError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            MurmurError::SessionError(_) => "Capture session error. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MurmurError>;
