//! Input files and format detection.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, ImportKind, Result};

/// Container format of an uploaded file, resolved once from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileFormat {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "geojson")]
    GeoJson,
}

impl FileFormat {
    /// Classify a file by its name suffix.
    ///
    /// `.zip` is an archive; `.geojson` and `.json` are GeoJSON. Matching is
    /// case-sensitive.
    pub fn detect(name: &str) -> Result<Self> {
        if name.ends_with(".zip") {
            Ok(FileFormat::Zip)
        } else if name.ends_with(".geojson") || name.ends_with(".json") {
            Ok(FileFormat::GeoJson)
        } else {
            Err(ImportError::UnsupportedFormat {
                name: name.to_string(),
            })
        }
    }

    pub fn import_kind(self) -> ImportKind {
        match self {
            FileFormat::Zip => ImportKind::Tracklog,
            FileFormat::GeoJson => ImportKind::GeoJson,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Zip => write!(f, "zip"),
            FileFormat::GeoJson => write!(f, "geojson"),
        }
    }
}

/// An uploaded file: its name and full contents.
#[derive(Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming it after the path's file name.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let format = FileFormat::detect(&name)?;
        let bytes = fs::read(path).map_err(|e| {
            ImportError::import_failed(format.import_kind(), format!("{}: {}", path.display(), e))
        })?;
        Ok(Self { name, bytes })
    }

    pub fn format(&self) -> Result<FileFormat> {
        FileFormat::detect(&self.name)
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_by_suffix() {
        assert_eq!(FileFormat::detect("walk.zip").unwrap(), FileFormat::Zip);
        assert_eq!(FileFormat::detect("walk.geojson").unwrap(), FileFormat::GeoJson);
        assert_eq!(FileFormat::detect("walk.json").unwrap(), FileFormat::GeoJson);
    }

    #[test]
    fn test_unsupported_suffix() {
        for name in ["walk.gpx", "walk", "walk.ZIP", "zip"] {
            let err = FileFormat::detect(name).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Unsupported file format. Please use .zip or .geojson files."
            );
        }
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.geojson");
        fs::File::create(&path)
            .unwrap()
            .write_all(br#"{"type":"FeatureCollection","features":[]}"#)
            .unwrap();

        let file = InputFile::from_path(&path).unwrap();
        assert_eq!(file.name, "track.geojson");
        assert_eq!(file.format().unwrap(), FileFormat::GeoJson);
        assert!(!file.bytes.is_empty());
    }

    #[test]
    fn test_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = InputFile::from_path(dir.path().join("nope.zip")).unwrap_err();
        assert!(matches!(
            err,
            ImportError::ImportFailed { kind: ImportKind::Tracklog, .. }
        ));
    }
}
