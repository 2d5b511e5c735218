//! Unified error handling for tracklog import.
//!
//! Validation reports these errors as values (see [`crate::ValidationResult`]);
//! imports return them through [`Result`].

use std::fmt;

use thiserror::Error;

/// Which importer a top-level failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Tracklog,
    GeoJson,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Tracklog => write!(f, "tracklog"),
            ImportKind::GeoJson => write!(f, "GeoJSON"),
        }
    }
}

/// Unified error type for validation and import operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// File name has neither a `.zip` nor a `.geojson`/`.json` suffix
    #[error("Unsupported file format. Please use .zip or .geojson files.")]
    UnsupportedFormat { name: String },

    /// Archive lacks one of the entries every tracklog export carries
    #[error("Missing required file: {entry}")]
    MissingRequiredEntry { entry: String },

    /// Tracklog entry parsed but has no breadcrumb sequence
    #[error("Invalid tracklog data: {message}")]
    MalformedTracklog { message: String },

    /// GeoJSON root is not a FeatureCollection
    #[error("Invalid GeoJSON: {message}")]
    InvalidGeoJson { message: String },

    /// Container could not be opened or parsed
    #[error("Failed to import {kind}: {message}")]
    ImportFailed { kind: ImportKind, message: String },

    /// Archive container could not be opened or read
    #[error("Invalid archive: {message}")]
    Archive { message: String },

    /// An entry or file is not valid JSON
    #[error("Invalid JSON in {entry}: {message}")]
    Json { entry: String, message: String },

    /// A single archive entry, breadcrumb or feature could not be used
    #[error("Invalid entry {entry}: {message}")]
    InvalidEntry { entry: String, message: String },

    /// Recording store or breadcrumb sink rejected a write
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl ImportError {
    /// Wrap any lower-level failure as a top-level import failure.
    pub fn import_failed(kind: ImportKind, cause: impl fmt::Display) -> Self {
        ImportError::ImportFailed {
            kind,
            message: cause.to_string(),
        }
    }

    pub fn storage(cause: impl fmt::Display) -> Self {
        ImportError::Storage {
            message: cause.to_string(),
        }
    }

    pub(crate) fn json(entry: &str, cause: impl fmt::Display) -> Self {
        ImportError::Json {
            entry: entry.to_string(),
            message: cause.to_string(),
        }
    }

    pub(crate) fn invalid_entry(entry: &str, cause: impl fmt::Display) -> Self {
        ImportError::InvalidEntry {
            entry: entry.to_string(),
            message: cause.to_string(),
        }
    }

    pub(crate) fn missing_breadcrumbs() -> Self {
        ImportError::MalformedTracklog {
            message: "missing breadcrumbs".to_string(),
        }
    }

    pub(crate) fn not_feature_collection() -> Self {
        ImportError::InvalidGeoJson {
            message: "must be a FeatureCollection".to_string(),
        }
    }
}

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Extension trait for converting Option to ImportError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a missing-entry error.
    fn ok_or_missing_entry(self, entry: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing_entry(self, entry: &str) -> Result<T> {
        self.ok_or_else(|| ImportError::MissingRequiredEntry {
            entry: entry.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ImportError::MissingRequiredEntry {
            entry: "export_summary.json".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required file: export_summary.json");

        assert_eq!(
            ImportError::not_feature_collection().to_string(),
            "Invalid GeoJSON: must be a FeatureCollection"
        );
        assert_eq!(
            ImportError::missing_breadcrumbs().to_string(),
            "Invalid tracklog data: missing breadcrumbs"
        );
    }

    #[test]
    fn test_import_failed_embeds_cause() {
        let err = ImportError::import_failed(ImportKind::GeoJson, "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "Failed to import GeoJSON: expected value at line 1"
        );
        let err = ImportError::import_failed(ImportKind::Tracklog, "bad zip");
        assert!(err.to_string().starts_with("Failed to import tracklog"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_missing_entry("tracklog/tracklog.json");
        assert!(matches!(
            result,
            Err(ImportError::MissingRequiredEntry { ref entry }) if entry == "tracklog/tracklog.json"
        ));
    }
}
