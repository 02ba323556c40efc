//! Row structs and their conversion into domain types.
//!
//! Stored values are re-validated on the way out; a row that no longer
//! satisfies a domain invariant surfaces as `RepoError::Serialization`.

use chrono::{DateTime, Utc};
use scanquest_domain::{
    BlockId, BlockRecord, CheckIn, CompletionMethod, Instance, InstanceId, InstanceName,
    InstanceSettings, Location, LocationId, LocationName, LocationStats, MarkerCode,
    NavigationMethod, NavigationMode, Team, TeamBlockState, TeamCode, TeamId, TeamName,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::infrastructure::ports::RepoError;

fn parse_uuid(raw: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(raw).map_err(|e| RepoError::serialization(format!("bad id {raw}: {e}")))
}

fn count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Narrow a stored integer, refusing values that do not fit.
fn small(column: &str, value: i64) -> Result<i32, RepoError> {
    i32::try_from(value)
        .map_err(|_| RepoError::serialization(format!("{column} out of range: {value}")))
}

fn json(raw: &str) -> Result<serde_json::Value, RepoError> {
    serde_json::from_str(raw).map_err(RepoError::serialization)
}

#[derive(Debug, FromRow)]
pub(super) struct InstanceRow {
    pub id: String,
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub navigation_mode: String,
    pub navigation_method: String,
    pub completion_method: String,
    pub max_next_locations: i64,
    pub enable_points: bool,
}

impl TryFrom<InstanceRow> for Instance {
    type Error = RepoError;

    fn try_from(row: InstanceRow) -> Result<Self, Self::Error> {
        let navigation_mode: NavigationMode = row
            .navigation_mode
            .parse()
            .map_err(RepoError::serialization)?;
        let navigation_method: NavigationMethod = row
            .navigation_method
            .parse()
            .map_err(RepoError::serialization)?;
        let completion_method: CompletionMethod = row
            .completion_method
            .parse()
            .map_err(RepoError::serialization)?;
        let settings = InstanceSettings::default()
            .with_navigation_mode(navigation_mode)
            .with_navigation_method(navigation_method)
            .with_completion_method(completion_method)
            .with_max_next_locations(count(row.max_next_locations))
            .with_points(row.enable_points);

        let name = InstanceName::new(row.name).map_err(RepoError::serialization)?;
        let mut instance = Instance::new(name)
            .with_id(InstanceId::from_uuid(parse_uuid(&row.id)?))
            .with_settings(settings);
        instance.start_time = row.start_time;
        instance.end_time = row.end_time;
        Ok(instance)
    }
}

#[derive(Debug, FromRow)]
pub(super) struct LocationRow {
    pub id: String,
    pub instance_id: String,
    pub name: String,
    pub marker_code: String,
    pub sort_order: i64,
    pub points: i64,
    pub clue: Option<String>,
    pub total_visits: i64,
    pub current_count: i64,
    pub avg_duration: f64,
}

impl TryFrom<LocationRow> for Location {
    type Error = RepoError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        let mut location = Location::new(
            InstanceId::from_uuid(parse_uuid(&row.instance_id)?),
            LocationName::new(row.name).map_err(RepoError::serialization)?,
            MarkerCode::new(&row.marker_code).map_err(RepoError::serialization)?,
        )
        .with_id(LocationId::from_uuid(parse_uuid(&row.id)?))
        .with_order(small("sort_order", row.sort_order)?)
        .with_points(small("points", row.points)?)
        .with_stats(LocationStats {
            total_visits: count(row.total_visits),
            current_count: count(row.current_count),
            avg_duration: row.avg_duration,
        });
        location.clue = row.clue;
        Ok(location)
    }
}

#[derive(Debug, FromRow)]
pub(super) struct TeamRow {
    pub id: String,
    pub code: String,
    pub instance_id: String,
    pub name: Option<String>,
    pub points: i64,
    pub has_started: bool,
    pub must_check_out: Option<String>,
}

impl TryFrom<TeamRow> for Team {
    type Error = RepoError;

    fn try_from(row: TeamRow) -> Result<Self, Self::Error> {
        let mut team = Team::new(
            InstanceId::from_uuid(parse_uuid(&row.instance_id)?),
            TeamCode::new(&row.code).map_err(RepoError::serialization)?,
        );
        team.id = TeamId::from_uuid(parse_uuid(&row.id)?);
        team.name = row
            .name
            .map(TeamName::new)
            .transpose()
            .map_err(RepoError::serialization)?;
        team.points = small("points", row.points)?;
        team.has_started = row.has_started;
        team.must_check_out = row
            .must_check_out
            .as_deref()
            .map(MarkerCode::new)
            .transpose()
            .map_err(RepoError::serialization)?;
        Ok(team)
    }
}

#[derive(Debug, FromRow)]
pub(super) struct CheckInRow {
    pub team_code: String,
    pub location_id: String,
    pub instance_id: String,
    pub time_in: DateTime<Utc>,
    pub time_out: Option<DateTime<Utc>>,
    pub must_check_out: bool,
    pub blocks_completed: bool,
    pub points: i64,
}

impl TryFrom<CheckInRow> for CheckIn {
    type Error = RepoError;

    fn try_from(row: CheckInRow) -> Result<Self, Self::Error> {
        let mut check_in = CheckIn::open(
            TeamCode::new(&row.team_code).map_err(RepoError::serialization)?,
            LocationId::from_uuid(parse_uuid(&row.location_id)?),
            InstanceId::from_uuid(parse_uuid(&row.instance_id)?),
            row.time_in,
        )
        .requiring_check_out(row.must_check_out)
        .with_points(small("points", row.points)?);
        check_in.blocks_completed = row.blocks_completed;
        check_in.time_out = row.time_out;
        Ok(check_in)
    }
}

#[derive(Debug, FromRow)]
pub(super) struct BlockRow {
    pub id: String,
    pub location_id: String,
    pub block_type: String,
    pub sort_order: i64,
    pub points: i64,
    pub data: String,
}

impl TryFrom<BlockRow> for BlockRecord {
    type Error = RepoError;

    fn try_from(row: BlockRow) -> Result<Self, Self::Error> {
        Ok(BlockRecord {
            id: BlockId::from_uuid(parse_uuid(&row.id)?),
            location_id: LocationId::from_uuid(parse_uuid(&row.location_id)?),
            block_type: row.block_type,
            order: small("sort_order", row.sort_order)?,
            points: small("points", row.points)?,
            data: json(&row.data)?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct BlockStateRow {
    pub team_code: String,
    pub block_id: String,
    pub player_data: String,
    pub is_complete: bool,
    pub points_awarded: i64,
}

impl TryFrom<BlockStateRow> for TeamBlockState {
    type Error = RepoError;

    fn try_from(row: BlockStateRow) -> Result<Self, Self::Error> {
        let mut state = TeamBlockState::new(
            BlockId::from_uuid(parse_uuid(&row.block_id)?),
            TeamCode::new(&row.team_code).map_err(RepoError::serialization)?,
        );
        state.player_data = json(&row.player_data)?;
        state.is_complete = row.is_complete;
        state.points_awarded = small("points_awarded", row.points_awarded)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_points_are_rejected() {
        let row = TeamRow {
            id: Uuid::new_v4().to_string(),
            code: "ABCD".to_string(),
            instance_id: Uuid::new_v4().to_string(),
            name: None,
            points: i64::from(i32::MAX) + 1,
            has_started: true,
            must_check_out: None,
        };
        let err = Team::try_from(row).unwrap_err();
        assert!(matches!(err, RepoError::Serialization(_)));
    }

    #[test]
    fn negative_points_within_range_survive() {
        let row = CheckInRow {
            team_code: "ABCD".to_string(),
            location_id: Uuid::new_v4().to_string(),
            instance_id: Uuid::new_v4().to_string(),
            time_in: Utc::now(),
            time_out: None,
            must_check_out: false,
            blocks_completed: true,
            points: -5,
        };
        assert_eq!(CheckIn::try_from(row).unwrap().points, -5);
    }
}
