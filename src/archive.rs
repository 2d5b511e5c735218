//! Reading tracklog export archives.
//!
//! An export archive carries:
//! - `tracklog/tracklog.json` with `sessionId` and a `breadcrumbs` array
//! - `export_summary.json`
//! - audio files under `audio/`
//! - optional per-recording metadata under `metadata/<recordingId>_metadata.json`
//!
//! Entry names are configurable through [`ArchiveLayout`] so archives from
//! older exporters can still be read.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{ImportError, OptionExt, Result};
use crate::store::MAX_AUDIO_BYTES;
use crate::types::RecordingMetadata;

/// Entry names inside a tracklog export archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub tracklog_entry: String,
    pub summary_entry: String,
    pub audio_prefix: String,
    pub metadata_prefix: String,
    pub metadata_suffix: String,
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self {
            tracklog_entry: "tracklog/tracklog.json".to_string(),
            summary_entry: "export_summary.json".to_string(),
            audio_prefix: "audio/".to_string(),
            metadata_prefix: "metadata/".to_string(),
            metadata_suffix: "_metadata.json".to_string(),
        }
    }
}

impl ArchiveLayout {
    /// Direct metadata entry name for a recording id.
    pub fn metadata_entry(&self, recording_id: &str) -> String {
        format!(
            "{}{}{}",
            self.metadata_prefix, recording_id, self.metadata_suffix
        )
    }
}

/// Tracklog entry contents. Breadcrumbs stay raw so each one can fail on
/// its own.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TracklogEntry {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub breadcrumbs: Option<Value>,
}

impl TracklogEntry {
    /// The breadcrumb array, or None when absent or not an array.
    pub fn breadcrumbs(&self) -> Option<&Vec<Value>> {
        self.breadcrumbs.as_ref().and_then(Value::as_array)
    }
}

/// Metadata files found by scanning the metadata prefix.
#[derive(Debug, Default)]
pub(crate) struct MetadataIndex {
    by_filename: HashMap<String, RecordingMetadata>,
    by_unique_id: HashMap<String, RecordingMetadata>,
}

impl MetadataIndex {
    /// Match by filename with extension, then by unique id, then by filename
    /// without extension.
    pub fn lookup(&self, filename: &str, recording_id: &str) -> Option<RecordingMetadata> {
        self.by_filename
            .get(filename)
            .or_else(|| self.by_unique_id.get(recording_id))
            .or_else(|| self.by_filename.get(recording_id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.by_unique_id.len().max(self.by_filename.len())
    }
}

/// An opened export archive.
pub(crate) struct TracklogArchive<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
    layout: &'a ArchiveLayout,
}

impl<'a> TracklogArchive<'a> {
    pub fn open(bytes: &'a [u8], layout: &'a ArchiveLayout) -> Result<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes)).map_err(|e| ImportError::Archive {
            message: e.to_string(),
        })?;
        Ok(Self { zip, layout })
    }

    pub fn layout(&self) -> &ArchiveLayout {
        self.layout
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.zip.file_names().any(|n| n == name)
    }

    /// Fail with the first required entry that is absent.
    pub fn require_entries(&self) -> Result<()> {
        for entry in [&self.layout.tracklog_entry, &self.layout.summary_entry] {
            self.has_entry(entry).then_some(()).ok_or_missing_entry(entry)?;
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self.zip.by_name(name).map_err(|e| match e {
            ZipError::FileNotFound => ImportError::MissingRequiredEntry {
                entry: name.to_string(),
            },
            other => ImportError::invalid_entry(name, other),
        })?;
        let mut buf = Vec::with_capacity(initial_capacity(file.size()));
        file.read_to_end(&mut buf)
            .map_err(|e| ImportError::invalid_entry(name, e))?;
        Ok(buf)
    }

    pub fn read_json<T: DeserializeOwned>(&mut self, name: &str) -> Result<T> {
        let bytes = self.read_bytes(name)?;
        serde_json::from_slice(&bytes).map_err(|e| ImportError::json(name, e))
    }

    pub fn read_tracklog(&mut self) -> Result<TracklogEntry> {
        let name = self.layout.tracklog_entry.clone();
        self.read_json(&name)
    }

    pub fn read_export_summary(&mut self) -> Result<Value> {
        let name = self.layout.summary_entry.clone();
        self.read_json(&name)
    }

    /// Audio entry paths in archive order, directories excluded.
    pub fn audio_entries(&self) -> Vec<String> {
        self.zip
            .file_names()
            .filter(|n| n.starts_with(&self.layout.audio_prefix) && !n.ends_with('/'))
            .map(str::to_string)
            .collect()
    }

    /// Scan every JSON file under the metadata prefix. Unreadable files are
    /// left out of the index.
    pub fn metadata_index(&mut self) -> MetadataIndex {
        let names: Vec<String> = self
            .zip
            .file_names()
            .filter(|n| n.starts_with(&self.layout.metadata_prefix) && n.ends_with(".json"))
            .map(str::to_string)
            .collect();

        let mut index = MetadataIndex::default();
        for name in names {
            match self.read_json::<RecordingMetadata>(&name) {
                Ok(meta) => {
                    if !meta.filename.is_empty() {
                        index.by_filename.insert(meta.filename.clone(), meta.clone());
                    }
                    if !meta.unique_id.is_empty() {
                        index.by_unique_id.insert(meta.unique_id.clone(), meta);
                    }
                }
                Err(e) => debug!("[Importer] Ignoring metadata {}: {}", name, e),
            }
        }
        index
    }

    /// Metadata for one audio entry.
    ///
    /// The direct `<id>_metadata.json` entry wins and must parse; otherwise
    /// the scanned index is consulted.
    pub fn recording_metadata(
        &mut self,
        index: &MetadataIndex,
        recording_id: &str,
        filename: &str,
    ) -> Result<Option<RecordingMetadata>> {
        let direct = self.layout.metadata_entry(recording_id);
        if self.has_entry(&direct) {
            return self.read_json(&direct).map(Some);
        }
        Ok(index.lookup(filename, recording_id))
    }
}

/// Buffer size to reserve for an entry. The declared size comes from the
/// archive header and is only a hint.
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_AUDIO_BYTES, |size| size.min(MAX_AUDIO_BYTES))
}

/// Strip the final extension from a file name (`a.b.wav` -> `a.b`).
pub(crate) fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && !ext.contains('/') => stem,
        _ => filename,
    }
}
