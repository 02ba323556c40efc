use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::BlockError;
use crate::value_objects::TeamCode;
use crate::BlockId;

/// A team's progress on one block.
///
/// A state without a team code is a preview state: it is handed to an admin
/// trying a block out and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamBlockState {
    pub block_id: BlockId,
    pub team_code: Option<TeamCode>,
    /// Opaque, block-specific
    pub player_data: Value,
    pub is_complete: bool,
    pub points_awarded: i32,
}

impl TeamBlockState {
    pub fn new(block_id: BlockId, team_code: TeamCode) -> Self {
        Self {
            block_id,
            team_code: Some(team_code),
            player_data: Value::Null,
            is_complete: false,
            points_awarded: 0,
        }
    }

    pub fn preview(block_id: BlockId) -> Self {
        Self {
            block_id,
            team_code: None,
            player_data: Value::Null,
            is_complete: false,
            points_awarded: 0,
        }
    }

    pub fn is_preview(&self) -> bool {
        self.team_code.is_none()
    }

    pub fn complete(&mut self, points: i32) {
        self.is_complete = true;
        self.points_awarded = points;
    }

    pub fn reopen(&mut self) {
        self.is_complete = false;
        self.points_awarded = 0;
    }

    /// Decode the player data, or the default when nothing was stored yet.
    pub fn player_data_as<T: DeserializeOwned + Default>(&self) -> Result<T, BlockError> {
        if self.player_data.is_null() {
            return Ok(T::default());
        }
        Ok(serde_json::from_value(self.player_data.clone())?)
    }

    pub fn set_player_data<T: Serialize>(&mut self, data: &T) -> Result<(), BlockError> {
        self.player_data = serde_json::to_value(data)?;
        Ok(())
    }
}
