//! Instance entity - One playable game with its locations and teams
//!
//! The instance carries the game configuration that drives navigation and
//! completion. Its status is computed from the schedule, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::InstanceName;
use crate::InstanceId;

/// How the next set of locations is chosen for a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    /// One location at a time, lowest `order` first
    #[default]
    Ordered,
    /// A stable per-team shuffle, several suggestions at a time
    Random,
    /// Every unvisited location is open
    FreeRoam,
}

impl NavigationMode {
    /// Get the string representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Random => "random",
            Self::FreeRoam => "free_roam",
        }
    }
}

impl FromStr for NavigationMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ordered" => Ok(Self::Ordered),
            "random" => Ok(Self::Random),
            "free_roam" | "freeroam" => Ok(Self::FreeRoam),
            other => Err(DomainError::parse(format!(
                "Unknown navigation mode: {other}"
            ))),
        }
    }
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How suggested locations are presented to players (display only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMethod {
    ShowMap,
    ShowMapAndNames,
    #[default]
    ShowNames,
    ShowClues,
}

impl NavigationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShowMap => "show_map",
            Self::ShowMapAndNames => "show_map_and_names",
            Self::ShowNames => "show_names",
            Self::ShowClues => "show_clues",
        }
    }
}

impl FromStr for NavigationMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "show_map" => Ok(Self::ShowMap),
            "show_map_and_names" => Ok(Self::ShowMapAndNames),
            "show_names" => Ok(Self::ShowNames),
            "show_clues" => Ok(Self::ShowClues),
            other => Err(DomainError::parse(format!(
                "Unknown navigation method: {other}"
            ))),
        }
    }
}

/// What a team must do at a location for the visit to count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMethod {
    #[default]
    CheckInOnly,
    CheckInAndOut,
}

impl CompletionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckInOnly => "check_in_only",
            Self::CheckInAndOut => "check_in_and_out",
        }
    }

    /// Whether a check-in leaves the team occupying the location until it checks out
    pub fn requires_check_out(&self) -> bool {
        matches!(self, Self::CheckInAndOut)
    }
}

impl FromStr for CompletionMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check_in_only" => Ok(Self::CheckInOnly),
            "check_in_and_out" => Ok(Self::CheckInAndOut),
            other => Err(DomainError::parse(format!(
                "Unknown completion method: {other}"
            ))),
        }
    }
}

/// Computed lifecycle status of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    Active,
    Closed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default number of suggestions in random mode
pub const DEFAULT_MAX_NEXT_LOCATIONS: u32 = 3;

/// Per-instance game configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSettings {
    pub navigation_mode: NavigationMode,
    pub navigation_method: NavigationMethod,
    pub completion_method: CompletionMethod,
    max_next_locations: u32,
    pub enable_points: bool,
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            navigation_mode: NavigationMode::default(),
            navigation_method: NavigationMethod::default(),
            completion_method: CompletionMethod::default(),
            max_next_locations: DEFAULT_MAX_NEXT_LOCATIONS,
            enable_points: true,
        }
    }
}

impl InstanceSettings {
    pub fn with_navigation_mode(mut self, mode: NavigationMode) -> Self {
        self.navigation_mode = mode;
        self
    }

    pub fn with_navigation_method(mut self, method: NavigationMethod) -> Self {
        self.navigation_method = method;
        self
    }

    pub fn with_completion_method(mut self, method: CompletionMethod) -> Self {
        self.completion_method = method;
        self
    }

    /// Set the random-mode suggestion count. Zero is raised to one.
    pub fn with_max_next_locations(mut self, max: u32) -> Self {
        self.max_next_locations = max.max(1);
        self
    }

    pub fn with_points(mut self, enabled: bool) -> Self {
        self.enable_points = enabled;
        self
    }

    /// Number of suggestions offered in random mode, always at least one
    pub fn max_next_locations(&self) -> u32 {
        self.max_next_locations.max(1)
    }
}

/// A playable game: locations, teams, schedule, and settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: InstanceId,
    pub name: InstanceName,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub settings: InstanceSettings,
}

impl Instance {
    pub fn new(name: InstanceName) -> Self {
        Self {
            id: InstanceId::new(),
            name,
            start_time: None,
            end_time: None,
            settings: InstanceSettings::default(),
        }
    }

    pub fn with_id(mut self, id: InstanceId) -> Self {
        self.id = id;
        self
    }

    pub fn with_settings(mut self, settings: InstanceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the playing window.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the end time is not after the start.
    pub fn with_schedule(
        mut self,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        if let (Some(start), Some(end)) = (start_time, end_time) {
            if end <= start {
                return Err(DomainError::validation(
                    "Instance end time must be after its start time",
                ));
            }
        }
        self.start_time = start_time;
        self.end_time = end_time;
        Ok(self)
    }

    /// Status at `now`.
    ///
    /// An instance without a start time has not been opened and counts as closed.
    pub fn status(&self, now: DateTime<Utc>) -> GameStatus {
        let Some(start) = self.start_time else {
            return GameStatus::Closed;
        };
        if start > now {
            return GameStatus::Scheduled;
        }
        match self.end_time {
            Some(end) if end <= now => GameStatus::Closed,
            _ => GameStatus::Active,
        }
    }

    /// Convenience for the common case of an instance open from `now` onward
    pub fn start_now(&mut self, now: DateTime<Utc>) {
        self.start_time = Some(now);
        if matches!(self.end_time, Some(end) if end <= now) {
            self.end_time = None;
        }
    }
}
