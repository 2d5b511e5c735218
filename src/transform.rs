//! Planar geographic transforms applied to imported coordinates.
//!
//! A transform moves an imported tracklog to a new place: translate first,
//! then scale and rotate about a pivot. Longitude is treated as the x axis
//! and latitude as the y axis, so the result is only meaningful for small
//! areas.
//!
//! ## Example
//! ```rust
//! use tracklog_import::{transform_location, LatLng, LatLngOffset, TransformOptions};
//!
//! let options = TransformOptions {
//!     translate: Some(LatLngOffset { lat: 1.0, lng: 1.0 }),
//!     ..Default::default()
//! };
//! let moved = transform_location(Some(LatLng::new(0.0, 0.0)), &options);
//! assert_eq!(moved, Some(LatLng::new(1.0, 1.0)));
//! ```

use geo::{Point, Rotate, Scale, Translate};
use serde::{Deserialize, Serialize};

use crate::LatLng;

/// Translation offsets in degrees. Missing axes default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLngOffset {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
}

/// Geographic transform settings.
///
/// Every field is optional and applies independently. A scale of 0 or a
/// rotation of 0 is treated the same as an absent field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    pub translate: Option<LatLngOffset>,
    /// Scale factor about `center`
    pub scale: Option<f64>,
    /// Counter-clockwise rotation about `center`, in degrees
    pub rotate: Option<f64>,
    /// Pivot for scale and rotation (origin when absent)
    pub center: Option<LatLng>,
}

impl TransformOptions {
    /// True when applying these options cannot move any point.
    pub fn is_identity(&self) -> bool {
        let no_translate = self
            .translate
            .map_or(true, |t| t.lat == 0.0 && t.lng == 0.0);
        let no_scale = self.scale.map_or(true, |s| s == 0.0 || s == 1.0);
        let no_rotate = self.rotate.map_or(true, |r| r == 0.0);
        no_translate && no_scale && no_rotate
    }

    fn pivot(&self) -> Point<f64> {
        self.center.unwrap_or_default().into()
    }
}

/// Apply translate, scale and rotate (in that order) to a location.
///
/// The pivot for scale and rotation is evaluated against the already
/// translated point. `None` passes through unchanged.
pub fn transform_location(location: Option<LatLng>, options: &TransformOptions) -> Option<LatLng> {
    let location = location?;
    let mut point: Point<f64> = location.into();

    if let Some(offset) = options.translate {
        point = point.translate(offset.lng, offset.lat);
    }

    if let Some(factor) = options.scale.filter(|s| *s != 0.0) {
        point = point.scale_around_point(factor, factor, options.pivot());
    }

    if let Some(degrees) = options.rotate.filter(|r| *r != 0.0) {
        point = point.rotate_around_point(degrees, options.pivot());
    }

    Some(point.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: LatLng, b: LatLng) {
        assert!(
            (a.lat - b.lat).abs() < 1e-9 && (a.lng - b.lng).abs() < 1e-9,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_none_passes_through() {
        let options = TransformOptions {
            translate: Some(LatLngOffset { lat: 3.0, lng: -2.0 }),
            scale: Some(2.0),
            rotate: Some(45.0),
            center: Some(LatLng::new(1.0, 1.0)),
        };
        assert_eq!(transform_location(None, &options), None);
    }

    #[test]
    fn test_identity_options() {
        let identity = TransformOptions {
            translate: Some(LatLngOffset::default()),
            scale: Some(1.0),
            rotate: Some(0.0),
            center: Some(LatLng::new(4.5, -74.0)),
        };
        assert!(identity.is_identity());
        assert!(TransformOptions::default().is_identity());

        for p in [
            LatLng::new(0.0, 0.0),
            LatLng::new(10.3, -84.7),
            LatLng::new(-33.86, 151.21),
        ] {
            assert_eq!(transform_location(Some(p), &identity), Some(p));
            assert_eq!(transform_location(Some(p), &TransformOptions::default()), Some(p));
        }
    }

    #[test]
    fn test_translate() {
        let options = TransformOptions {
            translate: Some(LatLngOffset { lat: 1.0, lng: 1.0 }),
            ..Default::default()
        };
        let result = transform_location(Some(LatLng::new(0.0, 0.0)), &options);
        assert_eq!(result, Some(LatLng::new(1.0, 1.0)));
    }

    #[test]
    fn test_scale_about_center() {
        let options = TransformOptions {
            scale: Some(2.0),
            center: Some(LatLng::new(10.0, 20.0)),
            ..Default::default()
        };
        let result = transform_location(Some(LatLng::new(11.0, 21.5)), &options).unwrap();
        assert_close(result, LatLng::new(12.0, 23.0));
    }

    #[test]
    fn test_rotate_quarter_turn() {
        // (lng=1, lat=0) rotated 90 degrees counter-clockwise lands on (lng=0, lat=1)
        let options = TransformOptions {
            rotate: Some(90.0),
            ..Default::default()
        };
        let result = transform_location(Some(LatLng::new(0.0, 1.0)), &options).unwrap();
        assert_close(result, LatLng::new(1.0, 0.0));
    }

    #[test]
    fn test_full_rotation_returns_original() {
        let center = LatLng::new(10.2, -84.1);
        let options = TransformOptions {
            rotate: Some(360.0),
            center: Some(center),
            ..Default::default()
        };
        for p in [LatLng::new(10.25, -84.05), LatLng::new(9.9, -84.3), center] {
            let result = transform_location(Some(p), &options).unwrap();
            assert_close(result, p);
        }
    }

    #[test]
    fn test_translate_applies_before_pivot() {
        // Translating onto the pivot means scale and rotate no longer move the point
        let options = TransformOptions {
            translate: Some(LatLngOffset { lat: 1.0, lng: 1.0 }),
            scale: Some(3.0),
            rotate: Some(33.0),
            center: Some(LatLng::new(1.0, 1.0)),
        };
        let result = transform_location(Some(LatLng::new(0.0, 0.0)), &options).unwrap();
        assert_close(result, LatLng::new(1.0, 1.0));
    }

    #[test]
    fn test_zero_scale_is_ignored() {
        let options = TransformOptions {
            scale: Some(0.0),
            ..Default::default()
        };
        let p = LatLng::new(5.0, 6.0);
        assert_eq!(transform_location(Some(p), &options), Some(p));
    }

    #[test]
    fn test_deserialize_partial_options() {
        let options: TransformOptions =
            serde_json::from_str(r#"{"translate": {"lat": 0.5}, "rotate": 15}"#).unwrap();
        assert_eq!(options.translate, Some(LatLngOffset { lat: 0.5, lng: 0.0 }));
        assert_eq!(options.rotate, Some(15.0));
        assert_eq!(options.scale, None);
        assert_eq!(options.center, None);
    }
}
