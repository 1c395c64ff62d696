use crate::audio::wav::wav_duration_seconds;
use crate::transcript::TranscriptManager;
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A recording on disk
#[derive(Debug, Clone)]
pub struct RecordingInfo {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub size_bytes: u64,
}

/// The on-disk collection of journal recordings.
///
/// Deleting a recording also removes its transcript entry so the store
/// never references missing audio.
pub struct RecordingLibrary {
    dir: PathBuf,
}

impl RecordingLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All recordings, oldest first. Files that fail to parse are
    /// listed with zero duration rather than hidden.
    pub fn list(&self) -> Result<Vec<RecordingInfo>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut recordings = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            let is_recording = path.extension().map(|e| e == "wav").unwrap_or(false)
                && path
                    .file_name()
                    .map(|n| n.to_string_lossy().starts_with("recording_"))
                    .unwrap_or(false);
            if !is_recording {
                continue;
            }

            let size_bytes = fs::metadata(&path)?.len();
            let duration_seconds = match wav_duration_seconds(&path) {
                Ok(d) => d,
                Err(e) => {
                    warn!("Could not read duration of {:?}: {}", path, e);
                    0.0
                }
            };

            recordings.push(RecordingInfo {
                path,
                duration_seconds,
                size_bytes,
            });
        }

        // Timestamped names sort chronologically
        recordings.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(recordings)
    }

    /// Total seconds of recorded audio
    pub fn total_duration_seconds(&self) -> Result<f64> {
        Ok(self.list()?.iter().map(|r| r.duration_seconds).sum())
    }

    /// Delete one recording and its transcript entry
    pub fn delete(&self, path: &Path, transcripts: &TranscriptManager) -> Result<bool> {
        if !path.exists() {
            warn!("Recording {:?} does not exist", path);
            return Ok(false);
        }

        fs::remove_file(path)?;
        transcripts.delete_for_audio(path)?;
        info!("Deleted recording {:?}", path);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::write_wav;
    use crate::transcript::{Hypothesis, TranscriptStore};

    fn temp_library(name: &str) -> (RecordingLibrary, PathBuf) {
        let dir = std::env::temp_dir().join(format!("murmur_lib_{}_{}", name, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        (RecordingLibrary::new(&dir), dir)
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let (library, dir) = temp_library("list");

        write_wav(dir.join("recording_100.wav"), &vec![0.0; 1600], 16000, 1).unwrap();
        write_wav(dir.join("recording_200.wav"), &vec![0.0; 3200], 16000, 1).unwrap();
        fs::write(dir.join("notes.txt"), "not audio").unwrap();

        let recordings = library.list().unwrap();
        assert_eq!(recordings.len(), 2);
        assert!(recordings[0].path < recordings[1].path);
        assert!((recordings[0].duration_seconds - 0.1).abs() < 1e-6);
        assert!((library.total_duration_seconds().unwrap() - 0.3).abs() < 1e-6);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_empty_dir() {
        let library = RecordingLibrary::new("/nonexistent/murmur");
        assert!(library.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_removes_transcript() {
        let (library, dir) = temp_library("delete");
        let store_path = dir.join("transcripts.json");
        let manager = TranscriptManager::new(TranscriptStore::open(&store_path).unwrap());

        let audio = dir.join("recording_300.wav");
        write_wav(&audio, &vec![0.0; 1600], 16000, 1).unwrap();
        manager
            .handle_hypothesis(&audio, &Hypothesis::final_text("delete me"))
            .unwrap();
        assert_eq!(manager.all_entries().len(), 1);

        assert!(library.delete(&audio, &manager).unwrap());
        assert!(!audio.exists());
        assert!(manager.all_entries().is_empty());

        let _ = fs::remove_dir_all(dir);
    }
}
