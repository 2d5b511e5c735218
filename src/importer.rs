//! # Tracklog Importer
//!
//! Imports tracklog archives and GeoJSON files into an [`ImportTarget`].
//!
//! Every import runs the same way: open the container (a failure here is
//! fatal and returned as [`ImportError::ImportFailed`]), then walk its
//! entries, transforming and persisting each one. A bad audio entry or
//! breadcrumb is logged and skipped, and the summary counts only what was
//! persisted. Nothing is rolled back.
//!
//! ## Example
//! ```rust
//! use tracklog_import::{ImportOptions, InputFile, MemoryStore, TracklogImporter};
//!
//! let geojson = r#"{"type": "FeatureCollection", "features": [
//!     {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-84.1, 10.2]},
//!      "properties": {"timestamp": 1700000000000, "isMoving": true}}
//! ]}"#;
//! let file = InputFile::new("walk.geojson", geojson);
//!
//! let mut importer = TracklogImporter::new(MemoryStore::new());
//! let format = importer.validate(&file).format().expect("valid file");
//! let outcome = importer.import(&file, format, &ImportOptions::default()).unwrap();
//! assert_eq!(outcome.imported_breadcrumbs(), 1);
//! assert_eq!(importer.target().imported_breadcrumbs().len(), 1);
//! ```

use log::{debug, error, info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::archive::{strip_extension, ArchiveLayout, MetadataIndex, TracklogArchive};
use crate::error::{ImportError, ImportKind, Result};
use crate::format::{FileFormat, InputFile};
use crate::geojson::{self, PointFeature};
use crate::store::ImportTarget;
use crate::summary::{summarize, MovementSummary};
use crate::types::{
    iso_now, now_millis, AudioExportSummary, Breadcrumb, GeoJsonImportSummary, ImportOptions,
    ImportSummary, ImportedRecording, RecordingMetadata,
};
use crate::validate::{validate_with_layout, ValidationResult};

/// Generate a session id for one import call.
///
/// The millisecond prefix keeps ids sortable; the uuid suffix keeps two
/// imports in the same millisecond apart.
pub fn new_session_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("imported-{}-{}", now_millis(), &suffix[..8])
}

/// Result of [`TracklogImporter::import`].
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Archive(ImportSummary),
    GeoJson(GeoJsonImportSummary),
}

impl ImportOutcome {
    pub fn imported_breadcrumbs(&self) -> usize {
        match self {
            ImportOutcome::Archive(summary) => summary.imported_breadcrumbs,
            ImportOutcome::GeoJson(summary) => summary.imported_breadcrumbs,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            ImportOutcome::Archive(summary) => &summary.new_session_id,
            ImportOutcome::GeoJson(summary) => &summary.session_id,
        }
    }
}

/// A tracklog rebuilt from parsed breadcrumbs.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracklog {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub summary: MovementSummary,
}

impl Tracklog {
    pub fn from_breadcrumbs(breadcrumbs: Vec<Breadcrumb>) -> Self {
        let start_time = breadcrumbs.iter().map(|b| b.timestamp).min();
        let end_time = breadcrumbs.iter().map(|b| b.timestamp).max();
        let summary = summarize(&breadcrumbs);
        Self {
            start_time,
            end_time,
            breadcrumbs,
            summary,
        }
    }
}

/// Imports files into a recording store and breadcrumb sink.
///
/// The importer holds no state between calls beyond its target.
pub struct TracklogImporter<T> {
    target: T,
    layout: ArchiveLayout,
}

impl<T: ImportTarget> TracklogImporter<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            layout: ArchiveLayout::default(),
        }
    }

    /// Read archives with non-default entry names.
    pub fn with_layout(mut self, layout: ArchiveLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    /// Validate a file without importing it.
    pub fn validate(&self, file: &InputFile) -> ValidationResult {
        validate_with_layout(file, &self.layout)
    }

    /// Import a file whose format was resolved by validation.
    pub fn import(
        &mut self,
        file: &InputFile,
        format: FileFormat,
        options: &ImportOptions,
    ) -> Result<ImportOutcome> {
        match format {
            FileFormat::Zip => self.import_from_archive(file, options).map(ImportOutcome::Archive),
            FileFormat::GeoJson => self
                .import_from_geojson(file, options)
                .map(ImportOutcome::GeoJson),
        }
    }

    // ========================================================================
    // Archive import
    // ========================================================================

    /// Import a tracklog export archive.
    pub fn import_from_archive(
        &mut self,
        file: &InputFile,
        options: &ImportOptions,
    ) -> Result<ImportSummary> {
        let fail = |e: ImportError| ImportError::import_failed(ImportKind::Tracklog, e);

        let layout = self.layout.clone();
        let mut archive = TracklogArchive::open(&file.bytes, &layout).map_err(fail)?;
        archive.require_entries().map_err(fail)?;
        let tracklog = archive.read_tracklog().map_err(fail)?;
        let export_summary = archive.read_export_summary().map_err(fail)?;

        info!(
            "[Importer] Importing tracklog {} from {} (exported {})",
            tracklog.session_id.as_deref().unwrap_or("<unknown>"),
            file.name,
            export_summary
                .get("exportDate")
                .and_then(Value::as_str)
                .unwrap_or("at an unknown date")
        );

        let session_id = new_session_id();
        let recordings = self.import_audio_entries(&mut archive, options);

        let raw_breadcrumbs: Vec<Result<Breadcrumb>> = match tracklog.breadcrumbs() {
            Some(items) => items
                .iter()
                .map(|item| {
                    serde_json::from_value(item.clone())
                        .map_err(|e| ImportError::invalid_entry("breadcrumb", e))
                })
                .collect(),
            None => {
                warn!("[Importer] No breadcrumbs found in tracklog data");
                Vec::new()
            }
        };
        let imported_breadcrumbs = self.persist_breadcrumbs(
            raw_breadcrumbs,
            &session_id,
            tracklog.session_id.as_deref(),
            options,
        );

        let summary = ImportSummary {
            original_session_id: tracklog.session_id.clone(),
            new_session_id: session_id,
            imported_recordings: recordings.len(),
            imported_breadcrumbs,
            import_date: iso_now(),
            recordings,
            options: options.clone(),
        };

        info!(
            "[Importer] Import completed: {} recordings, {} breadcrumbs as {}",
            summary.imported_recordings, summary.imported_breadcrumbs, summary.new_session_id
        );
        Ok(summary)
    }

    /// Import an audio-only export (audio, metadata and export summary, no tracklog).
    pub fn import_audio_export(&mut self, file: &InputFile) -> Result<AudioExportSummary> {
        let fail = |e: ImportError| ImportError::import_failed(ImportKind::Tracklog, e);

        let layout = self.layout.clone();
        let mut archive = TracklogArchive::open(&file.bytes, &layout).map_err(fail)?;
        archive.read_export_summary().map_err(fail)?;

        let recordings = self.import_audio_entries(&mut archive, &ImportOptions::default());
        info!(
            "[Importer] Audio export {}: imported {} recordings",
            file.name,
            recordings.len()
        );

        Ok(AudioExportSummary {
            imported_breadcrumbs: 0,
            imported_recordings: recordings.len(),
            session_id: None,
        })
    }

    fn import_audio_entries(
        &mut self,
        archive: &mut TracklogArchive<'_>,
        options: &ImportOptions,
    ) -> Vec<ImportedRecording> {
        let entries = archive.audio_entries();
        if entries.is_empty() {
            return Vec::new();
        }

        let index = archive.metadata_index();
        debug!(
            "[Importer] {} audio entries, {} metadata files indexed",
            entries.len(),
            index.len()
        );

        let mut imported = Vec::with_capacity(entries.len());
        for path in &entries {
            match self.import_audio_entry(archive, &index, path, options) {
                Ok(Some(recording)) => imported.push(recording),
                Ok(None) => {}
                Err(e) => warn!("[Importer] Failed to import audio file {}: {}", path, e),
            }
        }
        imported
    }

    fn import_audio_entry(
        &mut self,
        archive: &mut TracklogArchive<'_>,
        index: &MetadataIndex,
        path: &str,
        options: &ImportOptions,
    ) -> Result<Option<ImportedRecording>> {
        let filename = path
            .strip_prefix(archive.layout().audio_prefix.as_str())
            .unwrap_or(path)
            .to_string();
        let recording_id = strip_extension(&filename).to_string();

        let audio = archive.read_bytes(path)?;
        let mut metadata = archive
            .recording_metadata(index, &recording_id, &filename)?
            .unwrap_or_else(|| RecordingMetadata::synthesized(&recording_id, &filename));
        if metadata.unique_id.is_empty() {
            metadata.unique_id = recording_id.clone();
        }
        if metadata.filename.is_empty() {
            metadata.filename = filename.clone();
        }

        metadata.apply_options(options)?;

        if options.skip_unlocated_recordings && metadata.location.is_none() {
            warn!("[Importer] Skipping {}: no GPS location in metadata", filename);
            return Ok(None);
        }

        let new_id = self.target.save(&metadata, &audio)?;
        debug!("[Importer] Saved {} as {}", filename, new_id);

        Ok(Some(ImportedRecording {
            original_id: metadata.unique_id,
            new_id,
            filename,
        }))
    }

    // ========================================================================
    // GeoJSON import
    // ========================================================================

    /// Import breadcrumbs from a GeoJSON FeatureCollection.
    ///
    /// Audio-recording markers are counted but not imported, since the file
    /// carries no audio for them.
    pub fn import_from_geojson(
        &mut self,
        file: &InputFile,
        options: &ImportOptions,
    ) -> Result<GeoJsonImportSummary> {
        let features = geojson::parse_collection(&file.name, &file.bytes).map_err(|e| match e {
            ImportError::InvalidGeoJson { .. } => e,
            other => ImportError::import_failed(ImportKind::GeoJson, other),
        })?;

        let mut breadcrumbs = Vec::new();
        let mut audio_recordings = 0;
        for (i, feature) in features.iter().enumerate() {
            match geojson::classify(feature) {
                Some(PointFeature::Breadcrumb(Ok(b))) => breadcrumbs.push(b),
                Some(PointFeature::Breadcrumb(Err(e))) => {
                    warn!("[Importer] Skipping feature {} of {}: {}", i, file.name, e)
                }
                Some(PointFeature::AudioMarker) => audio_recordings += 1,
                None => {}
            }
        }

        let tracklog = Tracklog::from_breadcrumbs(breadcrumbs);
        info!(
            "[Importer] GeoJSON {}: {} breadcrumbs, {} audio markers, {:?} over {}m",
            file.name,
            tracklog.breadcrumbs.len(),
            audio_recordings,
            tracklog.summary.pattern,
            tracklog.summary.total_distance
        );

        let session_id = new_session_id();
        let imported_breadcrumbs = self.persist_breadcrumbs(
            tracklog.breadcrumbs.iter().cloned().map(Ok),
            &session_id,
            None,
            options,
        );

        Ok(GeoJsonImportSummary {
            imported_breadcrumbs,
            audio_recordings,
            import_date: iso_now(),
            session_id,
            start_time: tracklog.start_time,
            end_time: tracklog.end_time,
            summary: tracklog.summary,
        })
    }

    // ========================================================================
    // Shared breadcrumb step
    // ========================================================================

    /// Rebase each breadcrumb onto the new session and append the batch.
    ///
    /// Returns how many breadcrumbs reached the sink.
    fn persist_breadcrumbs<I>(
        &mut self,
        raw: I,
        session_id: &str,
        original_session_id: Option<&str>,
        options: &ImportOptions,
    ) -> usize
    where
        I: IntoIterator<Item = Result<Breadcrumb>>,
    {
        let mut batch = Vec::new();
        for (i, item) in raw.into_iter().enumerate() {
            match item.and_then(|b| b.rebase(options, session_id, original_session_id)) {
                Ok(b) => batch.push(b),
                Err(e) => warn!("[Importer] Failed to import breadcrumb {}: {}", i, e),
            }
        }

        if batch.is_empty() {
            return 0;
        }

        match self.target.append(session_id, &batch) {
            Ok(()) => batch.len(),
            Err(e) => {
                error!(
                    "[Importer] Failed to store {} breadcrumbs for {}: {}",
                    batch.len(),
                    session_id,
                    e
                );
                0
            }
        }
    }
}
