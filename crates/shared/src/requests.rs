//! Request bodies sent by players and organisers

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// First play: the team picks its display name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPlayingRequest {
    pub team_name: String,
}

/// A scanned (or typed) marker code, for check-in and check-out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub marker_code: String,
}

/// Player input for one block, form-style: each field may repeat
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInputRequest {
    pub block_id: Uuid,
    #[serde(default)]
    pub input: HashMap<String, Vec<String>>,
}

/// Organiser request to provision join codes for an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTeamsRequest {
    pub count: usize,
}

/// Organiser request to add a block to a location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockRequest {
    pub block_type: String,
}

/// Organiser edit of a block's content, form-style like player input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlockRequest {
    #[serde(default)]
    pub input: HashMap<String, Vec<String>>,
}

/// New presentation order for a location's blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBlocksRequest {
    pub block_ids: Vec<Uuid>,
}

/// Game configuration as the organiser edits it. Enum fields use their
/// snake_case names (`free_roam`, `show_clues`, `check_in_and_out`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSettingsDto {
    pub navigation_mode: String,
    pub navigation_method: String,
    pub completion_method: String,
    pub max_next_locations: u32,
    pub enable_points: bool,
}

/// New instance; settings default when omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceRequest {
    pub name: String,
    #[serde(default)]
    pub settings: Option<InstanceSettingsDto>,
}

/// Play window in RFC 3339. A missing start closes the game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInstanceRequest {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Create or replace a location's editable fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    pub name: String,
    pub marker_code: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub clue: Option<String>,
}

/// Teams whose progress should be wiped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTeamsRequest {
    pub codes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_input_defaults_to_empty() {
        let id = Uuid::new_v4();
        let req: BlockInputRequest =
            serde_json::from_value(serde_json::json!({ "blockId": id })).unwrap();
        assert_eq!(req.block_id, id);
        assert!(req.input.is_empty());
    }

    #[test]
    fn location_request_fills_optional_fields() {
        let req: LocationRequest = serde_json::from_value(serde_json::json!({
            "name": "Lighthouse",
            "markerCode": "AAA1"
        }))
        .unwrap();
        assert_eq!(req.order, 0);
        assert_eq!(req.points, 0);
        assert!(req.clue.is_none());
    }
}
