use crate::diff::{self, DiffStep};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// One stored delta between the previously reconstructed transcript of
/// an entry and a new final recognition hypothesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptVersion {
    pub id: Uuid,
    /// Dense, ascending, starting at 1 within an entry
    pub number: u64,
    pub recorded_at: DateTime<Utc>,
    pub steps: Vec<DiffStep>,
}

impl TranscriptVersion {
    pub fn new(number: u64, steps: Vec<DiffStep>) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            recorded_at: Utc::now(),
            steps,
        }
    }
}

/// A journal entry: one audio recording plus the full edit history of
/// its transcript. The current text is never stored directly; it is
/// recovered by replaying the version diffs in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Path of the audio recording this transcript belongs to
    pub audio_path: PathBuf,
    pub versions: Vec<TranscriptVersion>,
}

impl TranscriptEntry {
    pub fn new(audio_path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            audio_path: audio_path.into(),
            versions: Vec::new(),
        }
    }

    /// Number of the latest version, or 0 if none exist
    pub fn latest_version_number(&self) -> u64 {
        self.versions.last().map(|v| v.number).unwrap_or(0)
    }

    /// Reconstruct the current transcript text by replaying all version
    /// diffs against the empty string.
    pub fn reconstruct(&self) -> Result<String> {
        self.reconstruct_at(u64::MAX)
    }

    /// Reconstruct the transcript as it stood at version `number`
    /// (inclusive). Versions are stored sorted, so replay stops early.
    pub fn reconstruct_at(&self, number: u64) -> Result<String> {
        let mut text = String::new();
        for version in self.versions.iter().take_while(|v| v.number <= number) {
            text = diff::apply(&version.steps, &text)?;
        }
        Ok(text)
    }

    /// Append a version for `new_text`, diffed against the current
    /// reconstructed text. Returns the version number assigned.
    pub fn push_text(&mut self, new_text: &str) -> Result<u64> {
        let previous = self.reconstruct()?;
        let steps = diff::diff(&previous, new_text);
        let number = self.latest_version_number() + 1;
        self.versions.push(TranscriptVersion::new(number, steps));
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_entry_reconstructs_empty() {
        let entry = TranscriptEntry::new("/tmp/recording_0.wav");
        assert_eq!(entry.reconstruct().unwrap(), "");
        assert_eq!(entry.latest_version_number(), 0);
    }

    #[test]
    fn test_push_and_reconstruct() {
        let mut entry = TranscriptEntry::new("/tmp/recording_1.wav");
        assert_eq!(entry.push_text("today was").unwrap(), 1);
        assert_eq!(entry.push_text("today was a good day").unwrap(), 2);
        assert_eq!(entry.push_text("today was a great day").unwrap(), 3);

        assert_eq!(entry.reconstruct().unwrap(), "today was a great day");
        assert_eq!(entry.reconstruct_at(1).unwrap(), "today was");
        assert_eq!(entry.reconstruct_at(2).unwrap(), "today was a good day");
        // A number past the end yields the latest text
        assert_eq!(entry.reconstruct_at(99).unwrap(), "today was a great day");
    }

    #[test]
    fn test_version_numbers_dense() {
        let mut entry = TranscriptEntry::new("/tmp/recording_2.wav");
        for i in 1..=5u64 {
            assert_eq!(entry.push_text(&format!("text {}", i)).unwrap(), i);
        }
        let numbers: Vec<u64> = entry.versions.iter().map(|v| v.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut entry = TranscriptEntry::new("/tmp/recording_3.wav");
        entry.push_text("hello journal").unwrap();

        let json = serde_json::to_string(&entry).unwrap();
        let back: TranscriptEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, entry.id);
        assert_eq!(back.reconstruct().unwrap(), "hello journal");
    }
}
