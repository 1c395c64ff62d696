use super::types::TranscriptEntry;
use crate::Result;
use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// JSON-file-backed store of transcript entries.
///
/// Entries live in memory behind a read-write lock; every mutation is
/// flushed to disk with a write-to-temp-then-rename so a crash can
/// never leave a half-written store behind.
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    entries: Arc<RwLock<Vec<TranscriptEntry>>>,
    path: PathBuf,
}

impl TranscriptStore {
    /// Open the store at `path`, loading existing entries if the file
    /// is present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let data = fs::read_to_string(&path)?;
            let entries: Vec<TranscriptEntry> = serde_json::from_str(&data)?;
            info!("Loaded {} transcript entries from {:?}", entries.len(), path);
            entries
        } else {
            debug!("No transcript store at {:?}, starting empty", path);
            Vec::new()
        };

        Ok(Self {
            entries: Arc::new(RwLock::new(entries)),
            path,
        })
    }

    /// Path of the backing store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch the entry for `audio_path`, creating it if none exists
    pub fn fetch_or_create(&self, audio_path: &Path) -> Result<TranscriptEntry> {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.iter().find(|e| e.audio_path == audio_path) {
                return Ok(entry.clone());
            }
        }

        let entry = TranscriptEntry::new(audio_path);
        self.entries.write().push(entry.clone());
        self.save()?;
        debug!("Created transcript entry for {:?}", audio_path);
        Ok(entry)
    }

    /// Replace the stored copy of `entry` (matched by id) and persist
    pub fn update(&self, entry: TranscriptEntry) -> Result<()> {
        {
            let mut entries = self.entries.write();
            match entries.iter_mut().find(|e| e.id == entry.id) {
                Some(stored) => *stored = entry,
                None => entries.push(entry),
            }
        }
        self.save()
    }

    /// All entries, oldest first
    pub fn all(&self) -> Vec<TranscriptEntry> {
        self.entries.read().clone()
    }

    /// The most recently created entry
    pub fn latest(&self) -> Option<TranscriptEntry> {
        self.entries.read().last().cloned()
    }

    pub fn get(&self, id: Uuid) -> Option<TranscriptEntry> {
        self.entries.read().iter().find(|e| e.id == id).cloned()
    }

    /// Entries whose reconstructed text contains `keyword`
    /// (case-insensitive). Entries whose history fails to replay are
    /// skipped with a warning rather than aborting the search.
    pub fn search(&self, keyword: &str) -> Vec<TranscriptEntry> {
        let needle = keyword.to_lowercase();
        self.entries
            .read()
            .iter()
            .filter(|entry| match entry.reconstruct() {
                Ok(text) => text.to_lowercase().contains(&needle),
                Err(e) => {
                    warn!("Skipping entry {} in search: {}", entry.id, e);
                    false
                }
            })
            .cloned()
            .collect()
    }

    /// Delete the entry with `id`. Returns whether anything was removed.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|e| e.id != id);
            before != entries.len()
        };
        if removed {
            self.save()?;
            info!("Deleted transcript entry {}", id);
        }
        Ok(removed)
    }

    /// Remove all entries
    pub fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        self.save()?;
        info!("All transcript entries cleared");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn save(&self) -> Result<()> {
        let json = {
            let entries = self.entries.read();
            serde_json::to_string_pretty(&*entries)?
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("murmur_store_{}_{}.json", name, Uuid::new_v4()))
    }

    #[test]
    fn test_fetch_or_create_is_idempotent() {
        let path = temp_store_path("fetch");
        let store = TranscriptStore::open(&path).unwrap();

        let audio = Path::new("/tmp/recording_a.wav");
        let first = store.fetch_or_create(audio).unwrap();
        let second = store.fetch_or_create(audio).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.len(), 1);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let path = temp_store_path("roundtrip");

        {
            let store = TranscriptStore::open(&path).unwrap();
            let mut entry = store.fetch_or_create(Path::new("/tmp/r1.wav")).unwrap();
            entry.push_text("first thought").unwrap();
            entry.push_text("first thought, revised").unwrap();
            store.update(entry).unwrap();
        }

        let reopened = TranscriptStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        let entry = reopened.latest().unwrap();
        assert_eq!(entry.versions.len(), 2);
        assert_eq!(entry.reconstruct().unwrap(), "first thought, revised");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_search() {
        let path = temp_store_path("search");
        let store = TranscriptStore::open(&path).unwrap();

        let mut a = store.fetch_or_create(Path::new("/tmp/r2.wav")).unwrap();
        a.push_text("Walked by the River today").unwrap();
        store.update(a).unwrap();

        let mut b = store.fetch_or_create(Path::new("/tmp/r3.wav")).unwrap();
        b.push_text("Stayed home and read").unwrap();
        store.update(b).unwrap();

        assert_eq!(store.search("river").len(), 1);
        assert_eq!(store.search("today").len(), 1);
        assert_eq!(store.search("nothing").len(), 0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_delete_and_clear() {
        let path = temp_store_path("delete");
        let store = TranscriptStore::open(&path).unwrap();

        let a = store.fetch_or_create(Path::new("/tmp/r4.wav")).unwrap();
        store.fetch_or_create(Path::new("/tmp/r5.wav")).unwrap();
        assert_eq!(store.len(), 2);

        assert!(store.delete(a.id).unwrap());
        assert!(!store.delete(a.id).unwrap());
        assert_eq!(store.len(), 1);

        store.clear().unwrap();
        assert!(store.is_empty());

        let _ = fs::remove_file(&path);
    }
}
