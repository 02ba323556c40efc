use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{Block, BlockBase, BlockError, BlockInput, TeamBlockState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ChecklistProgress {
    #[serde(default)]
    checked_items: Vec<String>,
}

/// Players tick off every item in a list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistBlock {
    #[serde(skip)]
    base: BlockBase,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub list: Vec<ChecklistItem>,
}

impl ChecklistBlock {
    /// Item ids the team has ticked, per its player data
    pub fn checked_items(state: &TeamBlockState) -> Result<Vec<String>, BlockError> {
        state
            .player_data_as::<ChecklistProgress>()
            .map(|p| p.checked_items)
    }
}

impl Block for ChecklistBlock {
    fn base(&self) -> &BlockBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockBase {
        &mut self.base
    }

    fn block_type(&self) -> &'static str {
        "checklist"
    }

    fn display_name(&self) -> &'static str {
        "Checklist"
    }

    fn description(&self) -> &'static str {
        "Players must check off all items."
    }

    fn requires_validation(&self) -> bool {
        true
    }

    fn data(&self) -> Result<Value, BlockError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Items arrive as parallel `checklist-items` / `checklist-item-ids`
    /// lists; blank descriptions are dropped and new items get fresh ids.
    fn update_data(&mut self, input: &BlockInput) -> Result<(), BlockError> {
        self.base.update_points(input)?;
        if let Some(content) = input.first("content") {
            self.content = content.to_string();
        }
        if !input.contains("checklist-items") {
            return Ok(());
        }

        let ids = input.all("checklist-item-ids");
        self.list = input
            .all("checklist-items")
            .iter()
            .enumerate()
            .filter(|(_, desc)| !desc.trim().is_empty())
            .map(|(i, desc)| {
                let id = ids
                    .get(i)
                    .filter(|id| !id.trim().is_empty())
                    .cloned()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                ChecklistItem {
                    id,
                    description: desc.trim().to_string(),
                }
            })
            .collect();
        Ok(())
    }

    /// Each submission replaces the ticked set; unknown ids are ignored.
    fn validate(&self, state: &mut TeamBlockState, input: &BlockInput) -> Result<(), BlockError> {
        let submitted = input.all("checklist-item-ids");
        let progress = ChecklistProgress {
            checked_items: self
                .list
                .iter()
                .filter(|item| submitted.contains(&item.id))
                .map(|item| item.id.clone())
                .collect(),
        };
        state.set_player_data(&progress)?;

        if progress.checked_items.len() == self.list.len() {
            state.complete(self.base.points);
        } else {
            state.reopen();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockId;

    fn checklist() -> ChecklistBlock {
        let mut block = ChecklistBlock::default();
        block
            .update_data(
                &BlockInput::new()
                    .with("points", "3")
                    .with_all("checklist-items", ["Statue", "", "Fountain"])
                    .with_all("checklist-item-ids", ["a", "skip", ""]),
            )
            .unwrap();
        block
    }

    #[test]
    fn update_drops_blank_items_and_assigns_ids() {
        let block = checklist();
        assert_eq!(block.list.len(), 2);
        assert_eq!(block.list[0].id, "a");
        assert_eq!(block.list[1].description, "Fountain");
        assert!(!block.list[1].id.is_empty());
    }

    #[test]
    fn partial_ticks_leave_block_open() {
        let block = checklist();
        let mut state = TeamBlockState::preview(BlockId::new());
        block
            .validate(
                &mut state,
                &BlockInput::new().with_all("checklist-item-ids", ["a", "bogus"]),
            )
            .unwrap();
        assert!(!state.is_complete);
        assert_eq!(
            ChecklistBlock::checked_items(&state).unwrap(),
            vec!["a".to_string()]
        );
    }

    #[test]
    fn all_ticks_complete_block() {
        let block = checklist();
        let second = block.list[1].id.clone();
        let mut state = TeamBlockState::preview(BlockId::new());
        block
            .validate(
                &mut state,
                &BlockInput::new().with_all("checklist-item-ids", vec!["a".to_string(), second]),
            )
            .unwrap();
        assert!(state.is_complete);
        assert_eq!(state.points_awarded, 3);
    }
}
