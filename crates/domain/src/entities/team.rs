//! Team entity - A group of players sharing one join code

use serde::{Deserialize, Serialize};

use crate::value_objects::{MarkerCode, TeamCode, TeamName};
use crate::{InstanceId, TeamId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    /// Globally unique
    pub code: TeamCode,
    pub instance_id: InstanceId,
    pub name: Option<TeamName>,
    pub points: i32,
    pub has_started: bool,
    /// Marker of the location the team occupies, if it has yet to check out
    pub must_check_out: Option<MarkerCode>,
}

impl Team {
    pub fn new(instance_id: InstanceId, code: TeamCode) -> Self {
        Self {
            id: TeamId::new(),
            code,
            instance_id,
            name: None,
            points: 0,
            has_started: false,
            must_check_out: None,
        }
    }

    pub fn with_name(mut self, name: TeamName) -> Self {
        self.name = Some(name);
        self
    }

    /// Whether the team is free to scan in somewhere new
    pub fn is_free(&self) -> bool {
        self.must_check_out.is_none()
    }

    /// Whether the team occupies the location with this marker
    pub fn occupies(&self, marker: &MarkerCode) -> bool {
        self.must_check_out.as_ref() == Some(marker)
    }

    /// First play: record the display name and mark the team started.
    pub fn start(&mut self, name: TeamName) {
        self.name = Some(name);
        self.has_started = true;
    }

    /// Back to the freshly provisioned state; the code and instance are kept.
    pub fn reset(&mut self) {
        self.name = None;
        self.points = 0;
        self.has_started = false;
        self.must_check_out = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Team {
        Team::new(InstanceId::new(), TeamCode::new("ABCD").unwrap())
    }

    #[test]
    fn new_team_is_free_and_unstarted() {
        let t = team();
        assert!(t.is_free());
        assert!(!t.has_started);
        assert_eq!(t.points, 0);
    }

    #[test]
    fn occupancy_is_by_marker() {
        let mut t = team();
        let a = MarkerCode::new("A1").unwrap();
        t.must_check_out = Some(a.clone());
        assert!(!t.is_free());
        assert!(t.occupies(&a));
        assert!(!t.occupies(&MarkerCode::new("B2").unwrap()));
    }

    #[test]
    fn reset_clears_progress() {
        let mut t = team();
        t.start(TeamName::new("Owls").unwrap());
        t.points = 40;
        t.must_check_out = Some(MarkerCode::new("A1").unwrap());
        t.reset();
        assert_eq!(t.name, None);
        assert_eq!(t.points, 0);
        assert!(!t.has_started);
        assert!(t.is_free());
    }
}
