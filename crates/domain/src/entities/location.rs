//! Location entity - A physical point players reach by scanning its marker

use serde::{Deserialize, Serialize};

use crate::value_objects::{LocationName, MarkerCode};
use crate::{InstanceId, LocationId};

/// Running occupancy statistics for a location
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationStats {
    /// Check-ins ever recorded here
    pub total_visits: u32,
    /// Teams checked in and not yet checked out
    pub current_count: u32,
    /// Mean visit duration in seconds over closed check-ins
    pub avg_duration: f64,
}

/// `(old_avg * old_total + sample) / (old_total + 1)`
///
/// Check-out folds with the location's `total_visits`, which already counts
/// the visit being closed.
pub fn folded_average(old_avg: f64, old_total: u32, sample: f64) -> f64 {
    let total = f64::from(old_total);
    (old_avg * total + sample) / (total + 1.0)
}

/// A scannable location within an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub instance_id: InstanceId,
    pub name: LocationName,
    /// Unique within the instance
    pub marker_code: MarkerCode,
    /// Position in ordered navigation; ignored by the other modes
    pub order: i32,
    pub points: i32,
    /// Free-form hint shown when the instance navigates by clues
    pub clue: Option<String>,
    pub stats: LocationStats,
}

impl Location {
    pub fn new(instance_id: InstanceId, name: LocationName, marker_code: MarkerCode) -> Self {
        Self {
            id: LocationId::new(),
            instance_id,
            name,
            marker_code,
            order: 0,
            points: 0,
            clue: None,
            stats: LocationStats::default(),
        }
    }

    pub fn with_id(mut self, id: LocationId) -> Self {
        self.id = id;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_points(mut self, points: i32) -> Self {
        self.points = points;
        self
    }

    pub fn with_clue(mut self, clue: impl Into<String>) -> Self {
        self.clue = Some(clue.into());
        self
    }

    pub fn with_stats(mut self, stats: LocationStats) -> Self {
        self.stats = stats;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_weights_the_old_mean() {
        let avg = folded_average(60.0, 2, 90.0);
        assert!((avg - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn first_sample_is_the_mean() {
        assert!((folded_average(0.0, 0, 30.0) - 30.0).abs() < f64::EPSILON);
    }
}
