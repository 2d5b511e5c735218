//! Storage collaborators the importers persist into.
//!
//! Importers only see the two traits. [`MemoryStore`] keeps everything in
//! memory; the `persistence` feature adds a SQLite-backed store.

use log::debug;

use crate::error::{ImportError, Result};
use crate::types::{Breadcrumb, RecordingMetadata};

/// Largest audio payload a store accepts (10 MiB).
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

/// Blob + metadata store for recordings.
pub trait RecordingStore {
    /// Persist one recording and return its new id. Must be atomic per call.
    fn save(&mut self, metadata: &RecordingMetadata, audio: &[u8]) -> Result<String>;
}

/// Append-only destination for imported breadcrumbs.
pub trait BreadcrumbSink {
    fn append(&mut self, session_id: &str, breadcrumbs: &[Breadcrumb]) -> Result<()>;
}

/// Anything an importer can write both recordings and breadcrumbs into.
pub trait ImportTarget: RecordingStore + BreadcrumbSink {}

impl<T: RecordingStore + BreadcrumbSink> ImportTarget for T {}

impl<T: RecordingStore + ?Sized> RecordingStore for &mut T {
    fn save(&mut self, metadata: &RecordingMetadata, audio: &[u8]) -> Result<String> {
        (**self).save(metadata, audio)
    }
}

impl<T: BreadcrumbSink + ?Sized> BreadcrumbSink for &mut T {
    fn append(&mut self, session_id: &str, breadcrumbs: &[Breadcrumb]) -> Result<()> {
        (**self).append(session_id, breadcrumbs)
    }
}

/// Pairs a separate recording store and breadcrumb sink into one target.
#[derive(Debug, Default)]
pub struct SplitTarget<R, B> {
    pub recordings: R,
    pub breadcrumbs: B,
}

impl<R: RecordingStore, B> RecordingStore for SplitTarget<R, B> {
    fn save(&mut self, metadata: &RecordingMetadata, audio: &[u8]) -> Result<String> {
        self.recordings.save(metadata, audio)
    }
}

impl<R, B: BreadcrumbSink> BreadcrumbSink for SplitTarget<R, B> {
    fn append(&mut self, session_id: &str, breadcrumbs: &[Breadcrumb]) -> Result<()> {
        self.breadcrumbs.append(session_id, breadcrumbs)
    }
}

/// Reject recordings no store should accept.
pub fn check_recording(metadata: &RecordingMetadata, audio: &[u8]) -> Result<()> {
    if metadata.unique_id.is_empty() && metadata.filename.is_empty() {
        return Err(ImportError::storage("recording has neither uniqueId nor filename"));
    }
    if audio.is_empty() {
        return Err(ImportError::storage(format!(
            "audio for {} is 0 bytes",
            metadata.filename
        )));
    }
    if audio.len() > MAX_AUDIO_BYTES {
        return Err(ImportError::storage(format!(
            "audio for {} is {} bytes, maximum {} allowed",
            metadata.filename,
            audio.len(),
            MAX_AUDIO_BYTES
        )));
    }
    Ok(())
}

// ============================================================================
// In-memory store
// ============================================================================

/// A recording held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecording {
    pub id: String,
    pub metadata: RecordingMetadata,
    pub audio: Vec<u8>,
}

/// In-memory recording store and breadcrumb sink.
#[derive(Debug, Default)]
pub struct MemoryStore {
    recordings: Vec<StoredRecording>,
    breadcrumbs: Vec<Breadcrumb>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recordings(&self) -> &[StoredRecording] {
        &self.recordings
    }

    pub fn recording(&self, id: &str) -> Option<&StoredRecording> {
        self.recordings.iter().find(|r| r.id == id)
    }

    /// Every breadcrumb appended so far, oldest import first.
    pub fn imported_breadcrumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    /// Breadcrumbs appended under one session id.
    pub fn session_breadcrumbs<'a>(&'a self, session_id: &'a str) -> impl Iterator<Item = &'a Breadcrumb> + 'a {
        self.breadcrumbs
            .iter()
            .filter(move |b| b.session_id == session_id)
    }
}

impl RecordingStore for MemoryStore {
    fn save(&mut self, metadata: &RecordingMetadata, audio: &[u8]) -> Result<String> {
        check_recording(metadata, audio)?;

        let id = format!("recording-{}", self.recordings.len() + 1);
        self.recordings.push(StoredRecording {
            id: id.clone(),
            metadata: metadata.clone(),
            audio: audio.to_vec(),
        });
        debug!("[Store] Saved {} ({} bytes) as {}", metadata.filename, audio.len(), id);
        Ok(id)
    }
}

impl BreadcrumbSink for MemoryStore {
    fn append(&mut self, session_id: &str, breadcrumbs: &[Breadcrumb]) -> Result<()> {
        self.breadcrumbs.extend_from_slice(breadcrumbs);
        debug!(
            "[Store] Appended {} breadcrumbs for session {}",
            breadcrumbs.len(),
            session_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(id: &str) -> RecordingMetadata {
        RecordingMetadata::synthesized(id, &format!("{}.webm", id))
    }

    #[test]
    fn test_save_assigns_sequential_ids() {
        let mut store = MemoryStore::new();
        let a = store.save(&metadata("a"), b"RIFF").unwrap();
        let b = store.save(&metadata("b"), b"RIFF").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.recordings().len(), 2);
        assert_eq!(store.recording(&b).unwrap().metadata.unique_id, "b");
    }

    #[test]
    fn test_rejects_empty_audio() {
        let mut store = MemoryStore::new();
        let result = store.save(&metadata("a"), &[]);
        assert!(matches!(result, Err(ImportError::Storage { .. })));
        assert!(store.recordings().is_empty());
    }

    #[test]
    fn test_rejects_oversized_audio() {
        let big = vec![0u8; MAX_AUDIO_BYTES + 1];
        assert!(check_recording(&metadata("a"), &big).is_err());
        assert!(check_recording(&metadata("a"), &big[..MAX_AUDIO_BYTES]).is_ok());
    }

    #[test]
    fn test_rejects_anonymous_recording() {
        let mut meta = metadata("a");
        meta.unique_id.clear();
        meta.filename.clear();
        assert!(check_recording(&meta, b"x").is_err());
    }

    #[test]
    fn test_split_target_routes_calls() {
        let mut recordings = MemoryStore::new();
        let mut crumbs = MemoryStore::new();
        {
            let mut target = SplitTarget {
                recordings: &mut recordings,
                breadcrumbs: &mut crumbs,
            };
            target.save(&metadata("a"), b"x").unwrap();
            target.append("s", &[]).unwrap();
        }
        assert_eq!(recordings.recordings().len(), 1);
        assert!(crumbs.recordings().is_empty());
    }
}
