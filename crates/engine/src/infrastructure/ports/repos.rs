//! Repository port traits for database access.
//!
//! Writes that must stay consistent with each other (a check-in and the
//! team's occupancy, a check-out and the location statistics) are single
//! port methods so the adapter can run them in one transaction.

use async_trait::async_trait;
use scanquest_domain::{
    BlockId, BlockRecord, CheckIn, Instance, InstanceId, Location, LocationId, MarkerCode, Team,
    TeamBlockState, TeamCode, TeamName,
};

use super::error::RepoError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceRepo: Send + Sync {
    async fn get(&self, id: InstanceId) -> Result<Option<Instance>, RepoError>;
    async fn save(&self, instance: &Instance) -> Result<(), RepoError>;
    /// Removes the instance with its locations, blocks, teams, and all progress.
    async fn delete(&self, id: InstanceId) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationRepo: Send + Sync {
    async fn get(&self, id: LocationId) -> Result<Option<Location>, RepoError>;
    /// Sorted by `order`, then id
    async fn list_in_instance(&self, instance_id: InstanceId) -> Result<Vec<Location>, RepoError>;
    async fn find_by_marker(
        &self,
        instance_id: InstanceId,
        marker: &MarkerCode,
    ) -> Result<Option<Location>, RepoError>;
    /// Upsert. A marker code already used in the instance is a `Conflict`.
    async fn save(&self, location: &Location) -> Result<(), RepoError>;
    /// Removes the location with its blocks, block states, and check-ins.
    async fn delete(&self, id: LocationId) -> Result<(), RepoError>;
    /// Rebuild visit counts and mean durations from the check-in rows.
    async fn recompute_statistics(&self, instance_id: InstanceId) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeamRepo: Send + Sync {
    async fn get_by_code(&self, code: &TeamCode) -> Result<Option<Team>, RepoError>;
    async fn list_in_instance(&self, instance_id: InstanceId) -> Result<Vec<Team>, RepoError>;
    /// All or nothing. A code already in use is a `Conflict` keyed by that code.
    async fn insert_batch(&self, teams: &[Team]) -> Result<(), RepoError>;
    /// Mark the team started, replacing its display name when one is given.
    /// Score and occupancy are left alone.
    async fn start(&self, code: &TeamCode, name: Option<TeamName>) -> Result<(), RepoError>;
    /// Clear progress for the given teams and delete their check-ins and block states.
    async fn reset(&self, instance_id: InstanceId, codes: Vec<TeamCode>) -> Result<(), RepoError>;
    /// Remove the team with its check-ins and block states.
    async fn delete(&self, instance_id: InstanceId, code: &TeamCode) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckInRepo: Send + Sync {
    async fn find(
        &self,
        team_code: &TeamCode,
        location_id: LocationId,
    ) -> Result<Option<CheckIn>, RepoError>;
    /// Oldest first
    async fn list_for_team(&self, team_code: &TeamCode) -> Result<Vec<CheckIn>, RepoError>;
    /// Insert the check-in, claim the team, and count the visit, atomically.
    ///
    /// The team is claimed only while it occupies no location; otherwise the
    /// call fails with a `Conflict` on `"TeamOccupancy"` keyed by the occupied
    /// marker. `occupy` becomes the team's pending checkout and `team_points`
    /// is added to its score. A second check-in for the pair fails with a
    /// `Conflict` on `"CheckIn"`.
    async fn record_check_in(
        &self,
        check_in: &CheckIn,
        occupy: Option<MarkerCode>,
        team_points: i32,
    ) -> Result<(), RepoError>;
    /// Close the check-in, fold its duration into the location mean, release
    /// the occupant, and add `team_points`, atomically.
    ///
    /// Fails with `NotFound` if no open check-in exists for the pair.
    async fn record_check_out(
        &self,
        check_in: &CheckIn,
        duration_secs: f64,
        team_points: i32,
    ) -> Result<(), RepoError>;
    /// Set `blocks_completed`. Returns whether a row changed.
    async fn mark_blocks_completed(
        &self,
        team_code: &TeamCode,
        location_id: LocationId,
    ) -> Result<bool, RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlockRepo: Send + Sync {
    async fn get(&self, id: BlockId) -> Result<Option<BlockRecord>, RepoError>;
    /// Sorted by `order`
    async fn list_for_location(&self, location_id: LocationId)
        -> Result<Vec<BlockRecord>, RepoError>;
    async fn save(&self, block: &BlockRecord) -> Result<(), RepoError>;
    /// Assign `order` by position in `ids`; ids not at the location are ignored.
    async fn reorder(&self, location_id: LocationId, ids: Vec<BlockId>) -> Result<(), RepoError>;
    /// Remove the block and every team's state for it.
    async fn delete(&self, id: BlockId) -> Result<(), RepoError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlockStateRepo: Send + Sync {
    async fn get(
        &self,
        block_id: BlockId,
        team_code: &TeamCode,
    ) -> Result<Option<TeamBlockState>, RepoError>;
    async fn list_for_location_and_team(
        &self,
        location_id: LocationId,
        team_code: &TeamCode,
    ) -> Result<Vec<TeamBlockState>, RepoError>;
    /// Insert `state` unless the team already has one for the block, and
    /// return whichever is stored. Preview states are rejected.
    async fn insert_if_absent(&self, state: &TeamBlockState) -> Result<TeamBlockState, RepoError>;
    /// Store a validation result unless the stored state is already complete.
    ///
    /// When `state` is complete and this call is the one that completes it,
    /// `team_points` is added to the team's score in the same transaction.
    /// Returns whether this call completed the block.
    async fn record_validation(
        &self,
        state: &TeamBlockState,
        team_points: i32,
    ) -> Result<bool, RepoError>;
}
