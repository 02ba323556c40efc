//! Response bodies returned to players and organisers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::requests::InstanceSettingsDto;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A short message shown to the player after an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashMessageDto {
    pub level: FlashLevel,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// What a player may see about a location. The marker code is withheld.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub id: Uuid,
    pub name: String,
    pub points: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clue: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub points: i32,
    pub has_started: bool,
    /// Name of the location the team still has to check out of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_check_out: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatusResponse {
    pub status: String,
}

/// Where the team can go next
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NextLocationsResponse {
    Suggestions {
        /// Display style for the suggestions (map, names, clues, ...)
        navigation_method: String,
        locations: Vec<LocationSummary>,
    },
    /// Every location has been visited
    Finished,
    /// The team is still occupying a location
    CheckOutFirst { location: LocationSummary },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub location: LocationSummary,
    pub must_check_out: bool,
    pub blocks_completed: bool,
    pub flash: Vec<FlashMessageDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutResponse {
    pub location: LocationSummary,
    pub flash: Vec<FlashMessageDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStateResponse {
    pub block_id: Uuid,
    pub is_complete: bool,
    pub points_awarded: i32,
    pub player_data: serde_json::Value,
}

/// A block as the organiser edits it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub id: Uuid,
    pub location_id: Uuid,
    pub block_type: String,
    pub display_name: String,
    pub requires_validation: bool,
    pub order: i32,
    pub points: i32,
    pub data: serde_json::Value,
}

/// An instance as the organiser sees it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceResponse {
    pub id: Uuid,
    pub name: String,
    /// `scheduled`, `active` or `closed`
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub settings: InstanceSettingsDto,
}

/// A location with its marker code and visit statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub name: String,
    pub marker_code: String,
    pub order: i32,
    pub points: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clue: Option<String>,
    pub total_visits: u32,
    pub current_count: u32,
    /// Mean visit length in seconds
    pub avg_duration: f64,
}

/// One visited location in a team's history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub location: LocationSummary,
    /// RFC 3339
    pub time_in: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_out: Option<String>,
    pub blocks_completed: bool,
    pub points: i32,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Machine-readable classification
    pub code: String,
    pub flash: FlashMessageDto,
}
