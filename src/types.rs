//! Data models produced and consumed by the importers.
//!
//! Wire names are camelCase so the types read and write the same JSON the
//! tracklog exporter produces.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ImportError, Result};
use crate::summary::MovementSummary;
use crate::transform::{transform_location, TransformOptions};
use crate::LatLng;

// ============================================================================
// Breadcrumbs
// ============================================================================

/// A single timestamped GPS sample with motion and audio context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    pub lat: f64,
    pub lng: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Normalized input level (0-1)
    #[serde(default)]
    pub audio_level: f64,
    #[serde(default)]
    pub is_moving: bool,
    /// Speed in m/s
    #[serde(default)]
    pub movement_speed: f64,
    /// Heading in degrees
    #[serde(default)]
    pub direction: Option<f64>,
    /// Horizontal accuracy in meters
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub imported: bool,
    #[serde(default)]
    pub original_session_id: Option<String>,
}

impl Breadcrumb {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Build the imported copy of this breadcrumb.
    ///
    /// Applies the location transform and time offset, then tags the copy
    /// with the batch session id.
    pub fn rebase(
        &self,
        options: &ImportOptions,
        session_id: &str,
        original_session_id: Option<&str>,
    ) -> Result<Breadcrumb> {
        let location = match &options.location_transform {
            Some(transform) => transform_location(Some(self.location()), transform)
                .unwrap_or_else(|| self.location()),
            None => self.location(),
        };

        let timestamp = match options.effective_time_offset() {
            Some(offset) => self.timestamp.checked_add(offset).ok_or_else(|| {
                ImportError::InvalidEntry {
                    entry: "breadcrumb".to_string(),
                    message: format!("timestamp {} overflows with offset {}", self.timestamp, offset),
                }
            })?,
            None => self.timestamp,
        };

        Ok(Breadcrumb {
            lat: location.lat,
            lng: location.lng,
            timestamp,
            session_id: session_id.to_string(),
            imported: true,
            original_session_id: original_session_id.map(str::to_string),
            ..self.clone()
        })
    }
}

// ============================================================================
// Recordings
// ============================================================================

/// Metadata describing one audio recording.
///
/// Fields the importer does not interpret are kept in `extra` and written
/// back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub filename: String,
    /// ISO-8601 capture time
    #[serde(default)]
    pub timestamp: String,
    /// Length in seconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub location: Option<LatLng>,
    #[serde(default)]
    pub species_tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordingMetadata {
    /// Metadata for an audio entry that shipped without a metadata file.
    pub fn synthesized(recording_id: &str, filename: &str) -> Self {
        Self {
            unique_id: recording_id.to_string(),
            filename: filename.to_string(),
            timestamp: iso_now(),
            duration: 0.0,
            location: None,
            species_tags: Vec::new(),
            notes: "Imported recording".to_string(),
            extra: Map::new(),
        }
    }

    /// Apply the import options' location transform and time offset.
    pub fn apply_options(&mut self, options: &ImportOptions) -> Result<()> {
        if let Some(transform) = &options.location_transform {
            self.location = transform_location(self.location, transform);
        }
        if let Some(offset) = options.effective_time_offset() {
            self.timestamp = shift_iso_timestamp(&self.timestamp, offset)?;
        }
        Ok(())
    }
}

/// A recording that made it into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRecording {
    pub original_id: String,
    pub new_id: String,
    pub filename: String,
}

// ============================================================================
// Options
// ============================================================================

/// Options controlling how an import rewrites its input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    /// Geographic transform applied to breadcrumbs and recording locations
    pub location_transform: Option<TransformOptions>,
    /// Milliseconds added to every timestamp
    pub time_offset: Option<i64>,
    /// Skip recordings that have no location after transforming
    pub skip_unlocated_recordings: bool,
}

impl ImportOptions {
    /// Time offset to apply, if any. Zero counts as no offset.
    pub fn effective_time_offset(&self) -> Option<i64> {
        self.time_offset.filter(|offset| *offset != 0)
    }
}

// ============================================================================
// Results
// ============================================================================

/// Result of importing a tracklog archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub original_session_id: Option<String>,
    pub new_session_id: String,
    /// Recordings that were saved (not attempted)
    pub imported_recordings: usize,
    /// Breadcrumbs that reached the sink (not attempted)
    pub imported_breadcrumbs: usize,
    pub import_date: String,
    pub recordings: Vec<ImportedRecording>,
    pub options: ImportOptions,
}

/// Result of importing a GeoJSON FeatureCollection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoJsonImportSummary {
    pub imported_breadcrumbs: usize,
    /// Audio-recording markers found (counted, not imported)
    pub audio_recordings: usize,
    pub import_date: String,
    pub session_id: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub summary: MovementSummary,
}

/// Result of importing an audio-only export archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioExportSummary {
    pub imported_breadcrumbs: usize,
    pub imported_recordings: usize,
    pub session_id: Option<String>,
}

// ============================================================================
// Time helpers
// ============================================================================

/// Current time as an ISO-8601 string with millisecond precision.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Shift an ISO-8601 timestamp by `offset_ms` and re-serialize it in UTC.
pub fn shift_iso_timestamp(timestamp: &str, offset_ms: i64) -> Result<String> {
    let invalid = |message: String| ImportError::InvalidEntry {
        entry: "timestamp".to_string(),
        message,
    };

    let parsed = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|e| invalid(format!("'{}' is not ISO-8601: {}", timestamp, e)))?;
    let shifted = parsed
        .with_timezone(&Utc)
        .checked_add_signed(
            Duration::try_milliseconds(offset_ms)
                .ok_or_else(|| invalid(format!("offset {}ms is out of range", offset_ms)))?,
        )
        .ok_or_else(|| invalid(format!("'{}' shifted by {}ms is out of range", timestamp, offset_ms)))?;

    Ok(shifted.to_rfc3339_opts(SecondsFormat::Millis, true))
}
