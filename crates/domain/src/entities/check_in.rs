//! CheckIn entity - A team's visit to one location
//!
//! At most one check-in exists per (team, location); its existence is what
//! "visited" means. An open check-in has no `time_out`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::TeamCode;
use crate::{InstanceId, LocationId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub team_code: TeamCode,
    pub location_id: LocationId,
    pub instance_id: InstanceId,
    pub time_in: DateTime<Utc>,
    pub time_out: Option<DateTime<Utc>>,
    /// Whether the team has to scan out to finish this visit
    pub must_check_out: bool,
    /// Whether every block requiring validation has been completed
    pub blocks_completed: bool,
    /// Points earned for this visit
    pub points: i32,
}

impl CheckIn {
    pub fn open(
        team_code: TeamCode,
        location_id: LocationId,
        instance_id: InstanceId,
        time_in: DateTime<Utc>,
    ) -> Self {
        Self {
            team_code,
            location_id,
            instance_id,
            time_in,
            time_out: None,
            must_check_out: false,
            blocks_completed: true,
            points: 0,
        }
    }

    pub fn requiring_check_out(mut self, must_check_out: bool) -> Self {
        self.must_check_out = must_check_out;
        self
    }

    /// Visits gated by blocks start incomplete.
    pub fn requiring_validation(mut self, validation_required: bool) -> Self {
        self.blocks_completed = !validation_required;
        self
    }

    pub fn with_points(mut self, points: i32) -> Self {
        self.points = points;
        self
    }

    pub fn is_open(&self) -> bool {
        self.time_out.is_none()
    }

    /// Set `time_out`, returning the visit length in seconds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` if already closed.
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<f64, DomainError> {
        if !self.is_open() {
            return Err(DomainError::invalid_state_transition(
                "Check-in is already closed",
            ));
        }
        // Clock skew must not yield a zero or negative time_out
        let time_out = now.max(self.time_in);
        self.time_out = Some(time_out);
        Ok(self.duration_secs().unwrap_or_default())
    }

    /// Visit length in seconds for a closed check-in
    pub fn duration_secs(&self) -> Option<f64> {
        self.time_out
            .map(|out| (out - self.time_in).num_milliseconds() as f64 / 1000.0)
    }
}
