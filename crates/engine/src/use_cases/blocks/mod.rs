//! Content block use cases: admin CRUD and team validation state.

use std::collections::HashMap;
use std::sync::Arc;

use scanquest_domain::{
    Block, BlockBase, BlockError, BlockId, BlockInput, BlockRegistry, LocationId, TeamBlockState,
    TeamCode,
};

use crate::infrastructure::ports::{BlockRepo, BlockStateRepo, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum BlockServiceError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// A validated team state, and whether this submission completed the block
#[derive(Debug)]
pub struct Validation {
    pub state: TeamBlockState,
    pub completed_now: bool,
}

pub struct BlockService {
    block: Arc<dyn BlockRepo>,
    block_state: Arc<dyn BlockStateRepo>,
    registry: Arc<BlockRegistry>,
}

impl BlockService {
    pub fn new(
        block: Arc<dyn BlockRepo>,
        block_state: Arc<dyn BlockStateRepo>,
        registry: Arc<BlockRegistry>,
    ) -> Self {
        Self {
            block,
            block_state,
            registry,
        }
    }

    /// Add an empty block of `block_type` after the location's existing blocks.
    pub async fn create(
        &self,
        location_id: LocationId,
        block_type: &str,
    ) -> Result<Box<dyn Block>, BlockServiceError> {
        let existing = self.block.list_for_location(location_id).await?;
        let order = existing.iter().map(|b| b.order + 1).max().unwrap_or(0);
        let block = self
            .registry
            .create(block_type, BlockBase::new(location_id, order))?;
        self.block.save(&block.to_record()?).await?;

        tracing::debug!(
            block_id = %block.id(),
            location_id = %location_id,
            block_type,
            "Created block"
        );
        Ok(block)
    }

    pub async fn get(&self, block_id: BlockId) -> Result<Box<dyn Block>, BlockServiceError> {
        let record = self
            .block
            .get(block_id)
            .await?
            .ok_or(BlockServiceError::BlockNotFound(block_id))?;
        Ok(self.registry.hydrate(&record)?)
    }

    /// Blocks at the location in presentation order
    pub async fn list(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<Box<dyn Block>>, BlockServiceError> {
        self.block
            .list_for_location(location_id)
            .await?
            .iter()
            .map(|record| self.registry.hydrate(record).map_err(Into::into))
            .collect()
    }

    /// Replace the block's content from admin form input.
    pub async fn update(
        &self,
        block_id: BlockId,
        input: &BlockInput,
    ) -> Result<Box<dyn Block>, BlockServiceError> {
        let mut block = self.get(block_id).await?;
        block.update_data(input)?;
        self.block.save(&block.to_record()?).await?;
        Ok(block)
    }

    pub async fn reorder(
        &self,
        location_id: LocationId,
        block_ids: Vec<BlockId>,
    ) -> Result<(), BlockServiceError> {
        Ok(self.block.reorder(location_id, block_ids).await?)
    }

    /// Delete the block together with every team's state for it.
    pub async fn delete(&self, block_id: BlockId) -> Result<(), BlockServiceError> {
        self.block.delete(block_id).await.map_err(|e| {
            if e.is_not_found() {
                BlockServiceError::BlockNotFound(block_id)
            } else {
                BlockServiceError::Repo(e)
            }
        })
    }

    /// Whether any block at the location gates completion
    pub async fn validation_required_for_location(
        &self,
        location_id: LocationId,
    ) -> Result<bool, BlockServiceError> {
        Ok(self
            .list(location_id)
            .await?
            .iter()
            .any(|b| b.requires_validation()))
    }

    /// Whether the team still has a required block to finish at the location.
    /// A block the team has never touched counts as unfinished.
    pub async fn validation_outstanding(
        &self,
        location_id: LocationId,
        team_code: &TeamCode,
    ) -> Result<bool, BlockServiceError> {
        let blocks = self.list(location_id).await?;
        if !blocks.iter().any(|b| b.requires_validation()) {
            return Ok(false);
        }

        let complete: HashMap<BlockId, bool> = self
            .block_state
            .list_for_location_and_team(location_id, team_code)
            .await?
            .into_iter()
            .map(|s| (s.block_id, s.is_complete))
            .collect();

        Ok(blocks
            .iter()
            .filter(|b| b.requires_validation())
            .any(|b| !complete.get(&b.id()).copied().unwrap_or(false)))
    }

    /// The team's state for the block, created on first use.
    pub async fn state_for(
        &self,
        block_id: BlockId,
        team_code: &TeamCode,
    ) -> Result<TeamBlockState, BlockServiceError> {
        if let Some(state) = self.block_state.get(block_id, team_code).await? {
            return Ok(state);
        }
        Ok(self
            .block_state
            .insert_if_absent(&TeamBlockState::new(block_id, team_code.clone()))
            .await?)
    }

    /// A throwaway state for trying a block out; never persisted.
    pub fn preview_state(&self, block_id: BlockId) -> TeamBlockState {
        TeamBlockState::preview(block_id)
    }

    /// Run the block's validation against player input and store the result.
    ///
    /// A state that is already complete is returned untouched. Completion and
    /// the block's points (when `award_points` is set) are written together,
    /// and only by the submission that completes the block, so points are
    /// never paid twice. Preview states are validated but not saved.
    pub async fn validate_and_update_state(
        &self,
        block: &dyn Block,
        mut state: TeamBlockState,
        input: &BlockInput,
        award_points: bool,
    ) -> Result<Validation, BlockServiceError> {
        if state.is_complete {
            return Ok(Validation {
                state,
                completed_now: false,
            });
        }

        block.validate(&mut state, input)?;

        if state.is_preview() {
            let completed_now = state.is_complete;
            return Ok(Validation {
                state,
                completed_now,
            });
        }

        let team_points = if award_points && state.is_complete {
            state.points_awarded
        } else {
            0
        };
        let completed_now = self
            .block_state
            .record_validation(&state, team_points)
            .await?;
        if state.is_complete && !completed_now {
            tracing::debug!(
                block_id = %state.block_id,
                "Block was already completed by another submission"
            );
        }
        Ok(Validation {
            state,
            completed_now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockBlockRepo, MockBlockStateRepo};
    use mockall::predicate::*;
    use scanquest_domain::BlockRecord;

    fn service(block: MockBlockRepo, state: MockBlockStateRepo) -> BlockService {
        BlockService::new(
            Arc::new(block),
            Arc::new(state),
            Arc::new(BlockRegistry::new()),
        )
    }

    fn record(
        location_id: LocationId,
        block_type: &str,
        order: i32,
        data: serde_json::Value,
    ) -> BlockRecord {
        BlockRecord {
            id: BlockId::new(),
            location_id,
            block_type: block_type.to_string(),
            order,
            points: 5,
            data,
        }
    }

    fn password(location_id: LocationId) -> BlockRecord {
        record(
            location_id,
            "password",
            1,
            serde_json::json!({ "content": "Find the plaque", "password": "anchor", "fuzzy": false }),
        )
    }

    fn code() -> TeamCode {
        TeamCode::new("TEAM").unwrap()
    }

    #[tokio::test]
    async fn create_appends_after_existing_blocks() {
        let location_id = LocationId::new();
        let existing = vec![
            record(location_id, "markdown", 0, serde_json::Value::Null),
            record(location_id, "divider", 3, serde_json::Value::Null),
        ];
        let mut blocks = MockBlockRepo::new();
        blocks
            .expect_list_for_location()
            .with(eq(location_id))
            .returning(move |_| Ok(existing.clone()));
        blocks
            .expect_save()
            .withf(|r| r.block_type == "checklist" && r.order == 4)
            .times(1)
            .returning(|_| Ok(()));

        let block = service(blocks, MockBlockStateRepo::new())
            .create(location_id, "checklist")
            .await
            .unwrap();
        assert_eq!(block.order(), 4);
        assert_eq!(block.location_id(), location_id);
    }

    #[tokio::test]
    async fn create_rejects_unknown_types() {
        let mut blocks = MockBlockRepo::new();
        blocks.expect_list_for_location().returning(|_| Ok(vec![]));
        blocks.expect_save().never();

        let result = service(blocks, MockBlockStateRepo::new())
            .create(LocationId::new(), "hologram")
            .await;
        assert!(matches!(
            result,
            Err(BlockServiceError::Block(BlockError::UnknownType(_)))
        ));
    }

    #[tokio::test]
    async fn update_applies_admin_input() {
        let location_id = LocationId::new();
        let stored = password(location_id);
        let id = stored.id;
        let mut blocks = MockBlockRepo::new();
        blocks
            .expect_get()
            .with(eq(id))
            .returning(move |_| Ok(Some(stored.clone())));
        blocks
            .expect_save()
            .withf(|r| r.data["password"] == "lantern")
            .times(1)
            .returning(|_| Ok(()));

        let input = BlockInput::new()
            .with("content", "Look up")
            .with("block-passphrase", "lantern");
        service(blocks, MockBlockStateRepo::new())
            .update(id, &input)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_block_is_not_found() {
        let mut blocks = MockBlockRepo::new();
        blocks.expect_get().returning(|_| Ok(None));
        let result = service(blocks, MockBlockStateRepo::new())
            .get(BlockId::new())
            .await;
        assert!(matches!(result, Err(BlockServiceError::BlockNotFound(_))));
    }

    #[tokio::test]
    async fn location_requires_validation_if_any_block_does() {
        let location_id = LocationId::new();
        let mut blocks = MockBlockRepo::new();
        let records = vec![
            record(location_id, "markdown", 0, serde_json::Value::Null),
            password(location_id),
        ];
        blocks
            .expect_list_for_location()
            .returning(move |_| Ok(records.clone()));
        assert!(service(blocks, MockBlockStateRepo::new())
            .validation_required_for_location(location_id)
            .await
            .unwrap());

        let mut blocks = MockBlockRepo::new();
        let records = vec![record(location_id, "alert", 0, serde_json::Value::Null)];
        blocks
            .expect_list_for_location()
            .returning(move |_| Ok(records.clone()));
        assert!(!service(blocks, MockBlockStateRepo::new())
            .validation_required_for_location(location_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn untouched_required_block_is_outstanding() {
        let location_id = LocationId::new();
        let records = vec![password(location_id)];
        let block_id = records[0].id;

        let mut blocks = MockBlockRepo::new();
        let listed = records.clone();
        blocks
            .expect_list_for_location()
            .returning(move |_| Ok(listed.clone()));
        let mut states = MockBlockStateRepo::new();
        states
            .expect_list_for_location_and_team()
            .returning(|_, _| Ok(vec![]));
        assert!(service(blocks, states)
            .validation_outstanding(location_id, &code())
            .await
            .unwrap());

        let mut blocks = MockBlockRepo::new();
        blocks
            .expect_list_for_location()
            .returning(move |_| Ok(records.clone()));
        let mut states = MockBlockStateRepo::new();
        states.expect_list_for_location_and_team().returning(move |_, _| {
            let mut done = TeamBlockState::new(block_id, code());
            done.complete(5);
            Ok(vec![done])
        });
        assert!(!service(blocks, states)
            .validation_outstanding(location_id, &code())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn state_is_created_lazily() {
        let block_id = BlockId::new();
        let mut states = MockBlockStateRepo::new();
        states.expect_get().returning(|_, _| Ok(None));
        states
            .expect_insert_if_absent()
            .withf(move |s| s.block_id == block_id && !s.is_complete)
            .times(1)
            .returning(|s| Ok(s.clone()));

        let state = service(MockBlockRepo::new(), states)
            .state_for(block_id, &code())
            .await
            .unwrap();
        assert_eq!(state.team_code, Some(code()));
    }

    #[tokio::test]
    async fn correct_input_completes_and_pays_points() {
        let location_id = LocationId::new();
        let block = BlockRegistry::new().hydrate(&password(location_id)).unwrap();
        let mut states = MockBlockStateRepo::new();
        states.expect_insert_if_absent().never();
        states
            .expect_record_validation()
            .withf(|s, points| s.is_complete && s.points_awarded == 5 && *points == 5)
            .times(1)
            .returning(|_, _| Ok(true));

        let validation = service(MockBlockRepo::new(), states)
            .validate_and_update_state(
                block.as_ref(),
                TeamBlockState::new(block.id(), code()),
                &BlockInput::new().with("password", "anchor"),
                true,
            )
            .await
            .unwrap();
        assert!(validation.state.is_complete);
        assert!(validation.completed_now);
    }

    #[tokio::test]
    async fn points_are_withheld_when_disabled() {
        let location_id = LocationId::new();
        let block = BlockRegistry::new().hydrate(&password(location_id)).unwrap();
        let mut states = MockBlockStateRepo::new();
        states
            .expect_record_validation()
            .withf(|s, points| s.is_complete && *points == 0)
            .times(1)
            .returning(|_, _| Ok(true));

        let validation = service(MockBlockRepo::new(), states)
            .validate_and_update_state(
                block.as_ref(),
                TeamBlockState::new(block.id(), code()),
                &BlockInput::new().with("password", "anchor"),
                false,
            )
            .await
            .unwrap();
        assert!(validation.completed_now);
    }

    #[tokio::test]
    async fn losing_a_completion_race_is_not_a_second_completion() {
        let location_id = LocationId::new();
        let block = BlockRegistry::new().hydrate(&password(location_id)).unwrap();
        let mut states = MockBlockStateRepo::new();
        states
            .expect_record_validation()
            .times(1)
            .returning(|_, _| Ok(false));

        let validation = service(MockBlockRepo::new(), states)
            .validate_and_update_state(
                block.as_ref(),
                TeamBlockState::new(block.id(), code()),
                &BlockInput::new().with("password", "anchor"),
                true,
            )
            .await
            .unwrap();
        assert!(validation.state.is_complete);
        assert!(!validation.completed_now);
    }

    #[tokio::test]
    async fn completed_state_is_left_alone() {
        let location_id = LocationId::new();
        let block = BlockRegistry::new().hydrate(&password(location_id)).unwrap();
        let mut states = MockBlockStateRepo::new();
        states.expect_insert_if_absent().never();
        states.expect_record_validation().never();

        let mut done = TeamBlockState::new(block.id(), code());
        done.complete(5);
        let validation = service(MockBlockRepo::new(), states)
            .validate_and_update_state(
                block.as_ref(),
                done.clone(),
                &BlockInput::new().with("password", "wrong"),
                true,
            )
            .await
            .unwrap();
        assert_eq!(validation.state, done);
        assert!(!validation.completed_now);
    }

    #[tokio::test]
    async fn preview_state_is_never_saved() {
        let location_id = LocationId::new();
        let block = BlockRegistry::new().hydrate(&password(location_id)).unwrap();
        let mut states = MockBlockStateRepo::new();
        states.expect_insert_if_absent().never();
        states.expect_record_validation().never();

        let svc = service(MockBlockRepo::new(), states);
        let validation = svc
            .validate_and_update_state(
                block.as_ref(),
                svc.preview_state(block.id()),
                &BlockInput::new().with("password", "anchor"),
                false,
            )
            .await
            .unwrap();
        assert!(validation.state.is_complete);
        assert!(validation.state.is_preview());
    }
}
