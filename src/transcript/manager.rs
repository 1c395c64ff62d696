use super::store::TranscriptStore;
use super::types::TranscriptEntry;
use crate::{MurmurError, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A speech-recognition hypothesis for the current recording.
///
/// Recognizers emit a stream of partial hypotheses that refine each
/// other, followed by a final one. Only final hypotheses enter the
/// versioned history; partials just update the live text.
#[derive(Debug, Clone)]
pub struct Hypothesis {
    pub text: String,
    pub is_final: bool,
}

impl Hypothesis {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Routes recognition hypotheses into the versioned transcript store.
///
/// Each final hypothesis is diffed against the entry's reconstructed
/// text and appended as a new version, so the raw history is never
/// overwritten and any intermediate state can be replayed later.
pub struct TranscriptManager {
    store: TranscriptStore,
    /// Latest partial hypothesis, shown live but not yet persisted
    live_text: Arc<Mutex<String>>,
}

impl TranscriptManager {
    pub fn new(store: TranscriptStore) -> Self {
        Self {
            store,
            live_text: Arc::new(Mutex::new(String::new())),
        }
    }

    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    /// The latest partial hypothesis for the active recording
    pub fn live_text(&self) -> String {
        self.live_text.lock().clone()
    }

    /// Handle a hypothesis for the recording at `audio_path`.
    ///
    /// Returns the committed version number for final hypotheses, or
    /// `None` for partials and blank text.
    pub fn handle_hypothesis(&self, audio_path: &Path, hypothesis: &Hypothesis) -> Result<Option<u64>> {
        if hypothesis.text.trim().is_empty() {
            return Ok(None);
        }

        if !hypothesis.is_final {
            debug!("Partial hypothesis: {}", hypothesis.text);
            *self.live_text.lock() = hypothesis.text.clone();
            return Ok(None);
        }

        let mut entry = self.store.fetch_or_create(audio_path)?;
        let number = entry.push_text(&hypothesis.text)?;
        self.store.update(entry)?;
        self.live_text.lock().clear();

        info!(
            "Committed transcript version {} for {:?}",
            number, audio_path
        );
        Ok(Some(number))
    }

    /// All journal entries, oldest first
    pub fn all_entries(&self) -> Vec<TranscriptEntry> {
        self.store.all()
    }

    /// The most recent journal entry
    pub fn latest_entry(&self) -> Option<TranscriptEntry> {
        self.store.latest()
    }

    /// Current reconstructed text for the entry with `id`
    pub fn text_of(&self, id: Uuid) -> Result<String> {
        let entry = self
            .store
            .get(id)
            .ok_or_else(|| MurmurError::TranscriptError(format!("No entry with id {}", id)))?;
        entry.reconstruct()
    }

    /// Entries whose reconstructed text contains `keyword`
    pub fn search(&self, keyword: &str) -> Vec<TranscriptEntry> {
        self.store.search(keyword)
    }

    /// Delete one entry, e.g. when its recording is removed
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        self.store.delete(id)
    }

    /// Delete the entry associated with an audio file, if any
    pub fn delete_for_audio(&self, audio_path: &Path) -> Result<bool> {
        let id = self
            .store
            .all()
            .into_iter()
            .find(|e| e.audio_path == audio_path)
            .map(|e| e.id);
        match id {
            Some(id) => self.delete(id),
            None => {
                warn!("No transcript entry for {:?}", audio_path);
                Ok(false)
            }
        }
    }

    /// Clear the whole journal
    pub fn clear(&self) -> Result<()> {
        self.live_text.lock().clear();
        self.store.clear()
    }
}

/// Shared handle type used across pipeline threads
pub type SharedTranscriptManager = Arc<TranscriptManager>;

/// Convenience constructor for the common shared case
pub fn shared(store_path: impl Into<PathBuf>) -> Result<SharedTranscriptManager> {
    let store = TranscriptStore::open(store_path)?;
    Ok(Arc::new(TranscriptManager::new(store)))
}
