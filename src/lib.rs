//! # Tracklog Import
//!
//! Import pipeline for field-recording tracklogs.
//!
//! This library provides:
//! - Validation of uploaded tracklog archives and GeoJSON files
//! - Import of breadcrumb trails and audio recordings with metadata
//! - Planar translate/scale/rotate transforms and time shifting of imported data
//! - Movement statistics (distance, speeds, moving/stationary split)
//!
//! ## Features
//!
//! - **`persistence`** - Enable the SQLite-backed store
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use tracklog_import::{validate_file, InputFile};
//!
//! let file = InputFile::new("notes.txt", b"hello".to_vec());
//! let result = validate_file(&file);
//! assert!(!result.is_valid());
//! assert_eq!(
//!     result.error_message().as_deref(),
//!     Some("Unsupported file format. Please use .zip or .geojson files.")
//! );
//! ```

use geo::Point;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{ImportError, ImportKind, OptionExt, Result};

// Geographic utilities (haversine distance)
pub mod geo_utils;
pub use geo_utils::{distance, haversine_distance};

// Location transforms
pub mod transform;
pub use transform::{transform_location, LatLngOffset, TransformOptions};

// Data models
pub mod types;
pub use types::{
    AudioExportSummary, Breadcrumb, GeoJsonImportSummary, ImportOptions, ImportSummary,
    ImportedRecording, RecordingMetadata,
};

// Movement statistics
pub mod summary;
pub use summary::{summarize, MovementPattern, MovementSummary};

// Input files and format detection
pub mod format;
pub use format::{FileFormat, InputFile};

// Archive reading
pub mod archive;
pub use archive::ArchiveLayout;

// GeoJSON reading
pub mod geojson;

// Validation
pub mod validate;
pub use validate::{validate_file, validate_with_layout, ValidatedFile, ValidationResult};

// Storage collaborators
pub mod store;
pub use store::{
    BreadcrumbSink, ImportTarget, MemoryStore, RecordingStore, SplitTarget, StoredRecording,
};

// SQLite store
#[cfg(feature = "persistence")]
pub mod persistence;
#[cfg(feature = "persistence")]
pub use persistence::SqliteStore;

// Importers
pub mod importer;
pub use importer::{new_session_id, ImportOutcome, Tracklog, TracklogImporter};

// ============================================================================
// Core Types
// ============================================================================

/// A latitude/longitude pair in degrees.
///
/// # Example
/// ```
/// use tracklog_import::LatLng;
/// let point = LatLng::new(10.2, -84.1);
/// assert_eq!(point.lat, 10.2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for Point<f64> {
    fn from(p: LatLng) -> Self {
        Point::new(p.lng, p.lat)
    }
}

impl From<Point<f64>> for LatLng {
    fn from(p: Point<f64>) -> Self {
        LatLng::new(p.y(), p.x())
    }
}
