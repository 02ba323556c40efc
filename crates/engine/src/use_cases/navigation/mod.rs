//! Navigation use cases: which locations a team may visit next.

mod select;

pub use select::{select_next_locations, team_seed};

use std::collections::HashSet;
use std::sync::Arc;

use scanquest_domain::{Location, LocationId, Team};

use crate::infrastructure::ports::{CheckInRepo, InstanceRepo, LocationRepo, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("All locations visited")]
    AllLocationsVisited,
    #[error("Instance not found")]
    InstanceNotFound,
    #[error("Invalid next location")]
    InvalidNextLocation,
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Computes next locations from the instance settings and the team's check-ins.
///
/// Read-only: nothing here writes to storage.
pub struct NavigationSelector {
    instance: Arc<dyn InstanceRepo>,
    location: Arc<dyn LocationRepo>,
    check_in: Arc<dyn CheckInRepo>,
}

impl NavigationSelector {
    pub fn new(
        instance: Arc<dyn InstanceRepo>,
        location: Arc<dyn LocationRepo>,
        check_in: Arc<dyn CheckInRepo>,
    ) -> Self {
        Self {
            instance,
            location,
            check_in,
        }
    }

    pub async fn determine_next_locations(
        &self,
        team: &Team,
    ) -> Result<Vec<Location>, NavigationError> {
        let instance = self
            .instance
            .get(team.instance_id)
            .await?
            .ok_or(NavigationError::InstanceNotFound)?;
        let locations = self.location.list_in_instance(team.instance_id).await?;
        let visited: HashSet<LocationId> = self
            .check_in
            .list_for_team(&team.code)
            .await?
            .into_iter()
            .filter(|c| c.instance_id == team.instance_id)
            .map(|c| c.location_id)
            .collect();

        select_next_locations(&instance.settings, &team.code, &locations, &visited)
            .ok_or(NavigationError::AllLocationsVisited)
    }

    /// The next location whose marker matches `code`, compared trimmed and
    /// case-insensitively.
    pub async fn check_valid_location(
        &self,
        team: &Team,
        code: &str,
    ) -> Result<Location, NavigationError> {
        self.determine_next_locations(team)
            .await?
            .into_iter()
            .find(|l| l.marker_code.matches(code))
            .ok_or(NavigationError::InvalidNextLocation)
    }
}
