//! Reading breadcrumbs out of GeoJSON FeatureCollections.
//!
//! Point features are breadcrumbs unless `properties.type` is
//! `audio_recording`; those are markers for recordings whose audio is not
//! part of the file. Coordinates are `[lng, lat]`.

use serde_json::Value;

use crate::error::{ImportError, Result};
use crate::types::Breadcrumb;

/// `properties.type` tag of audio-recording markers.
pub const AUDIO_RECORDING_TAG: &str = "audio_recording";

/// A Point feature, classified.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PointFeature {
    Breadcrumb(Result<Breadcrumb>),
    AudioMarker,
}

/// Parse a FeatureCollection and return its features.
pub(crate) fn parse_collection(name: &str, bytes: &[u8]) -> Result<Vec<Value>> {
    let root: Value = serde_json::from_slice(bytes).map_err(|e| ImportError::json(name, e))?;

    if root.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(ImportError::not_feature_collection());
    }

    match root.get("features") {
        Some(Value::Array(features)) => Ok(features.clone()),
        _ => Err(ImportError::InvalidGeoJson {
            message: "missing features array".to_string(),
        }),
    }
}

fn properties(feature: &Value) -> Option<&serde_json::Map<String, Value>> {
    feature.get("properties").and_then(Value::as_object)
}

fn is_point(feature: &Value) -> bool {
    feature
        .get("geometry")
        .and_then(|g| g.get("type"))
        .and_then(Value::as_str)
        == Some("Point")
}

fn is_audio_marker(feature: &Value) -> bool {
    properties(feature)
        .and_then(|p| p.get("type"))
        .and_then(Value::as_str)
        == Some(AUDIO_RECORDING_TAG)
}

/// Classify one feature. Non-Point features are ignored.
pub(crate) fn classify(feature: &Value) -> Option<PointFeature> {
    if !is_point(feature) {
        return None;
    }
    if is_audio_marker(feature) {
        return Some(PointFeature::AudioMarker);
    }
    Some(PointFeature::Breadcrumb(breadcrumb_from_feature(feature)))
}

/// Number of Point features that are breadcrumbs (parseable or not).
pub(crate) fn count_breadcrumb_points(features: &[Value]) -> usize {
    features
        .iter()
        .filter(|f| is_point(f) && !is_audio_marker(f))
        .count()
}

fn breadcrumb_from_feature(feature: &Value) -> Result<Breadcrumb> {
    let coordinates = feature
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(Value::as_array)
        .ok_or_else(|| ImportError::invalid_entry("feature", "Point has no coordinates"))?;

    let (lng, lat) = match (
        coordinates.first().and_then(Value::as_f64),
        coordinates.get(1).and_then(Value::as_f64),
    ) {
        (Some(lng), Some(lat)) => (lng, lat),
        _ => {
            return Err(ImportError::invalid_entry(
                "feature",
                format!("expected [lng, lat], got {}", Value::Array(coordinates.clone())),
            ))
        }
    };

    let empty = serde_json::Map::new();
    let props = properties(feature).unwrap_or(&empty);
    let number = |key: &str| props.get(key).and_then(Value::as_f64);

    let timestamp = match props.get("timestamp") {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        _ => None,
    }
    .ok_or_else(|| ImportError::invalid_entry("feature", "Point has no numeric timestamp"))?;

    Ok(Breadcrumb {
        lat,
        lng,
        timestamp,
        audio_level: number("audioLevel").unwrap_or(0.0),
        is_moving: props.get("isMoving").and_then(Value::as_bool).unwrap_or(false),
        movement_speed: number("movementSpeed").unwrap_or(0.0),
        direction: number("direction"),
        accuracy: number("accuracy"),
        altitude: number("altitude"),
        session_id: String::new(),
        imported: false,
        original_session_id: None,
    })
}
