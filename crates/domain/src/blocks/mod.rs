//! Content blocks attached to locations.
//!
//! A block is a closed, tagged variant behind the [`Block`] trait. Display
//! blocks (markdown, alert, divider) only present content. Input blocks
//! (password, answer, pincode, checklist) gate a visit: the location is not
//! complete for a team until each of them has been validated. The
//! [`BlockRegistry`] maps a stored type tag back to a constructor.

mod checklist;
mod display;
mod error;
mod guess;
mod input;
mod registry;
mod state;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::{BlockId, LocationId};

pub use checklist::{ChecklistBlock, ChecklistItem};
pub use display::{AlertBlock, DividerBlock, MarkdownBlock};
pub use error::BlockError;
pub use guess::{AnswerBlock, GuessLog, PasswordBlock, PincodeBlock};
pub use input::BlockInput;
pub use registry::{BlockConstructor, BlockRegistry};
pub use state::TeamBlockState;

/// Attributes every block shares, independent of its variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockBase {
    pub id: BlockId,
    pub location_id: LocationId,
    /// Presentation order within the location
    pub order: i32,
    pub points: i32,
}

impl BlockBase {
    pub fn new(location_id: LocationId, order: i32) -> Self {
        Self {
            id: BlockId::new(),
            location_id,
            order,
            points: 0,
        }
    }

    /// Apply an optional "points" field from admin input.
    pub(crate) fn update_points(&mut self, input: &BlockInput) -> Result<(), BlockError> {
        if let Some(raw) = input.first("points") {
            self.points = raw
                .trim()
                .parse()
                .map_err(|_| BlockError::invalid("points", "must be an integer"))?;
        }
        Ok(())
    }
}

/// The persisted form of a block: shared columns plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub id: BlockId,
    pub location_id: LocationId,
    pub block_type: String,
    pub order: i32,
    pub points: i32,
    pub data: Value,
}

impl BlockRecord {
    pub fn base(&self) -> BlockBase {
        BlockBase {
            id: self.id,
            location_id: self.location_id,
            order: self.order,
            points: self.points,
        }
    }
}

pub trait Block: Send + Sync + fmt::Debug {
    fn base(&self) -> &BlockBase;

    fn base_mut(&mut self) -> &mut BlockBase;

    /// Stable type tag used for storage and the registry
    fn block_type(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Whether the block gates completion of its location
    fn requires_validation(&self) -> bool;

    /// Type-specific payload, as stored
    fn data(&self) -> Result<Value, BlockError>;

    /// Apply admin form input to the payload.
    fn update_data(&mut self, input: &BlockInput) -> Result<(), BlockError>;

    /// Check player input, updating `state` in place.
    ///
    /// A wrong guess is not an error: it is recorded in the player data and
    /// leaves the state incomplete. Errors are reserved for missing fields
    /// and unreadable data.
    fn validate(&self, state: &mut TeamBlockState, input: &BlockInput)
        -> Result<(), BlockError>;

    fn id(&self) -> BlockId {
        self.base().id
    }

    fn location_id(&self) -> LocationId {
        self.base().location_id
    }

    fn order(&self) -> i32 {
        self.base().order
    }

    fn points(&self) -> i32 {
        self.base().points
    }

    fn to_record(&self) -> Result<BlockRecord, BlockError> {
        let base = self.base();
        Ok(BlockRecord {
            id: base.id,
            location_id: base.location_id,
            block_type: self.block_type().to_string(),
            order: base.order,
            points: base.points,
            data: self.data()?,
        })
    }
}
