//! Movement statistics derived from a breadcrumb sequence.
//!
//! The averages here are per-segment, not physical: `average_speed` is the
//! mean of the segment speeds regardless of how long each segment lasted,
//! and moving/stationary time split the total elapsed time by sample count.
//! Exported session summaries are computed the same way, so imported
//! sessions stay comparable with recorded ones.

use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::types::Breadcrumb;

/// Share of samples above which a track counts as moving or stationary.
const PATTERN_THRESHOLD: f64 = 0.8;

/// Overall motion classification of a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementPattern {
    #[default]
    Stationary,
    Moving,
    Mixed,
}

/// Aggregate movement statistics for a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementSummary {
    /// Meters, rounded to whole meters
    pub total_distance: f64,
    /// Mean of per-segment speeds in m/s, 2 decimals
    pub average_speed: f64,
    /// Fastest segment in m/s, 2 decimals
    pub max_speed: f64,
    /// Seconds
    pub stationary_time: i64,
    /// Seconds
    pub moving_time: i64,
    pub pattern: MovementPattern,
}

/// Summarize a breadcrumb sequence.
///
/// Segments with a zero, negative or overflowing time delta contribute their
/// distance but a speed of 0, and still count toward the segment average.
/// A negative or overflowing total elapsed time counts as 0 seconds.
pub fn summarize(breadcrumbs: &[Breadcrumb]) -> MovementSummary {
    let Some((first, last)) = breadcrumbs.first().zip(breadcrumbs.last()) else {
        return MovementSummary::default();
    };

    let mut total_distance = 0.0;
    let mut total_speed = 0.0;
    let mut max_speed: f64 = 0.0;

    for pair in breadcrumbs.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let distance = haversine_distance(&prev.location(), &curr.location());
        let speed = match elapsed_ms(prev.timestamp, curr.timestamp) {
            Some(ms) => distance / (ms as f64 / 1000.0),
            None => 0.0,
        };

        total_distance += distance;
        total_speed += speed;
        max_speed = max_speed.max(speed);
    }

    let samples = breadcrumbs.len() as f64;
    let moving_count = breadcrumbs.iter().filter(|b| b.is_moving).count() as f64;
    let stationary_count = samples - moving_count;

    let segments = breadcrumbs.len() - 1;
    let average_speed = if segments > 0 {
        total_speed / segments as f64
    } else {
        0.0
    };

    let total_time_ms = elapsed_ms(first.timestamp, last.timestamp).unwrap_or(0) as f64;
    let stationary_time_ms = stationary_count / samples * total_time_ms;
    let moving_time_ms = total_time_ms - stationary_time_ms;

    let pattern = if moving_count / samples > PATTERN_THRESHOLD {
        MovementPattern::Moving
    } else if stationary_count / samples > PATTERN_THRESHOLD {
        MovementPattern::Stationary
    } else {
        MovementPattern::Mixed
    };

    MovementSummary {
        total_distance: total_distance.round(),
        average_speed: round2(average_speed),
        max_speed: round2(max_speed),
        stationary_time: (stationary_time_ms / 1000.0).round() as i64,
        moving_time: (moving_time_ms / 1000.0).round() as i64,
        pattern,
    }
}

/// Positive milliseconds from `start` to `end`, if any.
fn elapsed_ms(start: i64, end: i64) -> Option<i64> {
    end.checked_sub(start).filter(|ms| *ms > 0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
