//! Pre-import validation of uploaded files.
//!
//! Validation is read-only: it classifies the file, checks the structure an
//! import needs and reports what it found, without touching any store.
//! Failures come back as a [`ValidationResult::Invalid`] value so UI code
//! can show the message directly.

use log::{debug, warn};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::archive::{ArchiveLayout, TracklogArchive};
use crate::error::{ImportError, Result};
use crate::format::{FileFormat, InputFile};
use crate::geojson;
use crate::types::now_millis;

/// What validation learned about a file that can be imported.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFile {
    pub format: FileFormat,
    pub breadcrumb_count: usize,
    /// Tracklog session id for archives; a synthesized `geojson-<ms>` id for GeoJSON
    pub session_id: Option<String>,
}

/// Outcome of [`validate_file`].
///
/// Serializes to `{"valid": true, "type", "breadcrumbCount", "sessionId"}`
/// or `{"valid": false, "error"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid(ValidatedFile),
    Invalid(ImportError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    /// Format to hand to the importer, when valid.
    pub fn format(&self) -> Option<FileFormat> {
        match self {
            ValidationResult::Valid(file) => Some(file.format),
            ValidationResult::Invalid(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            ValidationResult::Valid(_) => None,
            ValidationResult::Invalid(err) => Some(err.to_string()),
        }
    }

    pub fn into_result(self) -> Result<ValidatedFile> {
        match self {
            ValidationResult::Valid(file) => Ok(file),
            ValidationResult::Invalid(err) => Err(err),
        }
    }
}

impl From<Result<ValidatedFile>> for ValidationResult {
    fn from(result: Result<ValidatedFile>) -> Self {
        match result {
            Ok(file) => ValidationResult::Valid(file),
            Err(err) => ValidationResult::Invalid(err),
        }
    }
}

impl Serialize for ValidationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ValidationResult::Valid(file) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("valid", &true)?;
                map.serialize_entry("type", &file.format)?;
                map.serialize_entry("breadcrumbCount", &file.breadcrumb_count)?;
                map.serialize_entry("sessionId", &file.session_id)?;
                map.end()
            }
            ValidationResult::Invalid(err) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("valid", &false)?;
                map.serialize_entry("error", &err.to_string())?;
                map.end()
            }
        }
    }
}

/// Validate a file using the default archive layout.
pub fn validate_file(file: &InputFile) -> ValidationResult {
    validate_with_layout(file, &ArchiveLayout::default())
}

/// Validate a file against a specific archive layout.
pub fn validate_with_layout(file: &InputFile, layout: &ArchiveLayout) -> ValidationResult {
    let result = file.format().and_then(|format| match format {
        FileFormat::Zip => validate_archive(&file.bytes, layout),
        FileFormat::GeoJson => validate_geojson(&file.name, &file.bytes),
    });

    match &result {
        Ok(found) => debug!(
            "[Validator] {} is a valid {} file with {} breadcrumbs",
            file.name, found.format, found.breadcrumb_count
        ),
        Err(err) => warn!("[Validator] Rejected {}: {}", file.name, err),
    }
    result.into()
}

fn validate_archive(bytes: &[u8], layout: &ArchiveLayout) -> Result<ValidatedFile> {
    let mut archive = TracklogArchive::open(bytes, layout)?;
    archive.require_entries()?;

    let tracklog = archive.read_tracklog()?;
    let breadcrumbs = tracklog
        .breadcrumbs()
        .ok_or_else(ImportError::missing_breadcrumbs)?;

    Ok(ValidatedFile {
        format: FileFormat::Zip,
        breadcrumb_count: breadcrumbs.len(),
        session_id: tracklog.session_id.clone(),
    })
}

fn validate_geojson(name: &str, bytes: &[u8]) -> Result<ValidatedFile> {
    let features = geojson::parse_collection(name, bytes)?;

    Ok(ValidatedFile {
        format: FileFormat::GeoJson,
        breadcrumb_count: geojson::count_breadcrumb_points(&features),
        session_id: Some(format!("geojson-{}", now_millis())),
    })
}
