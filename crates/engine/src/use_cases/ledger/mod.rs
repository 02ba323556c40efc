//! Check-in / check-out ledger.
//!
//! Tracks each team's visits and keeps location occupancy in step. The
//! per-(team, location) state machine is:
//!
//! ```text
//! unvisited -> checked in (open) -> [blocks completed] -> checked out
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use scanquest_domain::{CheckIn, Location, LocationId, Team, TeamCode};

use crate::infrastructure::ports::{CheckInRepo, ClockPort, LocationRepo, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The team still has to check out of another location
    #[error("Team must check out at {marker} first")]
    OccupiedElsewhere { marker: String },
    /// The team is scanning the location it already occupies
    #[error("Team must check out here")]
    MustCheckOutHere,
    #[error("Team has already checked in here")]
    AlreadyCheckedIn,
    #[error("No open check-in for this location")]
    NoOpenCheckIn,
    #[error("Check-in not found")]
    CheckInNotFound,
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// How a check-in should be recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisitRules {
    /// The team occupies the location until it checks out
    pub must_check_out: bool,
    /// Some block at the location needs completing first
    pub validation_required: bool,
    pub award_points: bool,
}

/// A visited location and the check-in that recorded it
#[derive(Debug, Clone)]
pub struct Visit {
    pub check_in: CheckIn,
    pub location: Location,
}

pub struct CheckInLedger {
    check_in: Arc<dyn CheckInRepo>,
    location: Arc<dyn LocationRepo>,
    clock: Arc<dyn ClockPort>,
}

impl CheckInLedger {
    pub fn new(
        check_in: Arc<dyn CheckInRepo>,
        location: Arc<dyn LocationRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            check_in,
            location,
            clock,
        }
    }

    pub async fn has_visited(
        &self,
        team_code: &TeamCode,
        location_id: LocationId,
    ) -> Result<bool, LedgerError> {
        Ok(self.check_in.find(team_code, location_id).await?.is_some())
    }

    pub async fn find(
        &self,
        team_code: &TeamCode,
        location_id: LocationId,
    ) -> Result<Option<CheckIn>, LedgerError> {
        Ok(self.check_in.find(team_code, location_id).await?)
    }

    /// Record a team arriving at a location.
    ///
    /// Location points go to the team now unless it has to check out, in
    /// which case they are paid on check-out.
    pub async fn check_in(
        &self,
        team: &Team,
        location: &Location,
        rules: VisitRules,
    ) -> Result<CheckIn, LedgerError> {
        if let Some(marker) = &team.must_check_out {
            return Err(if *marker == location.marker_code {
                LedgerError::MustCheckOutHere
            } else {
                LedgerError::OccupiedElsewhere {
                    marker: marker.to_string(),
                }
            });
        }
        if self.has_visited(&team.code, location.id).await? {
            return Err(LedgerError::AlreadyCheckedIn);
        }

        let points = if rules.award_points && !rules.must_check_out {
            location.points
        } else {
            0
        };
        let check_in = CheckIn::open(
            team.code.clone(),
            location.id,
            location.instance_id,
            self.clock.now(),
        )
        .requiring_check_out(rules.must_check_out)
        .requiring_validation(rules.validation_required)
        .with_points(points);
        let occupy = rules
            .must_check_out
            .then(|| location.marker_code.clone());

        self.check_in
            .record_check_in(&check_in, occupy, points)
            .await
            .map_err(|e| {
                if let Some(marker) = e.conflict_key("TeamOccupancy") {
                    if location.marker_code.matches(marker) {
                        LedgerError::MustCheckOutHere
                    } else {
                        LedgerError::OccupiedElsewhere {
                            marker: marker.to_string(),
                        }
                    }
                } else if e.conflict_key("CheckIn").is_some() {
                    LedgerError::AlreadyCheckedIn
                } else {
                    LedgerError::Repo(e)
                }
            })?;

        tracing::info!(
            team_code = %team.code,
            location_id = %location.id,
            must_check_out = rules.must_check_out,
            "Team checked in"
        );
        Ok(check_in)
    }

    /// Close the team's open check-in at `location`.
    pub async fn check_out(
        &self,
        team: &Team,
        location: &Location,
        award_points: bool,
    ) -> Result<CheckIn, LedgerError> {
        let mut check_in = self
            .check_in
            .find(&team.code, location.id)
            .await?
            .ok_or(LedgerError::CheckInNotFound)?;
        let duration_secs = check_in
            .close(self.clock.now())
            .map_err(|_| LedgerError::NoOpenCheckIn)?;

        let points = if award_points { location.points } else { 0 };
        check_in.points += points;

        self.check_in
            .record_check_out(&check_in, duration_secs, points)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    LedgerError::NoOpenCheckIn
                } else {
                    LedgerError::Repo(e)
                }
            })?;

        tracing::info!(
            team_code = %team.code,
            location_id = %location.id,
            duration_secs,
            "Team checked out"
        );
        Ok(check_in)
    }

    /// Mark the team's visit as having every required block done. Repeat
    /// calls are no-ops.
    pub async fn complete_blocks(
        &self,
        team_code: &TeamCode,
        location_id: LocationId,
    ) -> Result<(), LedgerError> {
        let check_in = self
            .check_in
            .find(team_code, location_id)
            .await?
            .ok_or(LedgerError::CheckInNotFound)?;
        if check_in.blocks_completed {
            return Ok(());
        }

        if self
            .check_in
            .mark_blocks_completed(team_code, location_id)
            .await?
        {
            tracing::debug!(team_code = %team_code, location_id = %location_id, "Blocks completed");
        }
        Ok(())
    }

    /// The team's visits in this instance, oldest first
    pub async fn history(&self, team: &Team) -> Result<Vec<Visit>, LedgerError> {
        let locations: HashMap<LocationId, Location> = self
            .location
            .list_in_instance(team.instance_id)
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        Ok(self
            .check_in
            .list_for_team(&team.code)
            .await?
            .into_iter()
            .filter_map(|check_in| {
                let location = locations.get(&check_in.location_id)?.clone();
                Some(Visit { check_in, location })
            })
            .collect())
    }
}
