use async_trait::async_trait;
use scanquest_domain::{BlockId, LocationId, TeamBlockState, TeamCode};
use sqlx::SqlitePool;

use super::rows::BlockStateRow;
use crate::infrastructure::ports::{BlockStateRepo, RepoError};

pub struct SqliteBlockStateRepo {
    pool: SqlitePool,
}

impl SqliteBlockStateRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockStateRepo for SqliteBlockStateRepo {
    async fn get(
        &self,
        block_id: BlockId,
        team_code: &TeamCode,
    ) -> Result<Option<TeamBlockState>, RepoError> {
        let row = sqlx::query_as::<_, BlockStateRow>(
            r#"
            SELECT team_code, block_id, player_data, is_complete, points_awarded
            FROM team_block_states WHERE block_id = ? AND team_code = ?
            "#,
        )
        .bind(block_id.to_string())
        .bind(team_code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("block_state.get", e))?;

        row.map(TeamBlockState::try_from).transpose()
    }

    async fn list_for_location_and_team(
        &self,
        location_id: LocationId,
        team_code: &TeamCode,
    ) -> Result<Vec<TeamBlockState>, RepoError> {
        let rows = sqlx::query_as::<_, BlockStateRow>(
            r#"
            SELECT s.team_code, s.block_id, s.player_data, s.is_complete, s.points_awarded
            FROM team_block_states s
            JOIN blocks b ON b.id = s.block_id
            WHERE b.location_id = ? AND s.team_code = ?
            ORDER BY b.sort_order
            "#,
        )
        .bind(location_id.to_string())
        .bind(team_code.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("block_state.list_for_location_and_team", e))?;

        rows.into_iter().map(TeamBlockState::try_from).collect()
    }

    async fn insert_if_absent(&self, state: &TeamBlockState) -> Result<TeamBlockState, RepoError> {
        let team_code = state
            .team_code
            .as_ref()
            .ok_or_else(|| RepoError::constraint("preview block states are never persisted"))?;
        let player_data =
            serde_json::to_string(&state.player_data).map_err(RepoError::serialization)?;

        sqlx::query(
            r#"
            INSERT INTO team_block_states (team_code, block_id, player_data, is_complete, points_awarded)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(team_code, block_id) DO NOTHING
            "#,
        )
        .bind(team_code.as_str())
        .bind(state.block_id.to_string())
        .bind(player_data)
        .bind(state.is_complete)
        .bind(state.points_awarded)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("block_state.insert_if_absent", e))?;

        self.get(state.block_id, team_code)
            .await?
            .ok_or_else(|| RepoError::not_found("TeamBlockState", state.block_id))
    }

    async fn record_validation(
        &self,
        state: &TeamBlockState,
        team_points: i32,
    ) -> Result<bool, RepoError> {
        let team_code = state
            .team_code
            .as_ref()
            .ok_or_else(|| RepoError::constraint("preview block states are never persisted"))?;
        let player_data =
            serde_json::to_string(&state.player_data).map_err(RepoError::serialization)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("block_state.record_validation", e))?;

        // The write lock is taken here, so a concurrent completion waits and
        // then sees the row as complete.
        let written = sqlx::query(
            r#"
            INSERT INTO team_block_states (team_code, block_id, player_data, is_complete, points_awarded)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(team_code, block_id) DO UPDATE SET
                player_data = excluded.player_data,
                is_complete = excluded.is_complete,
                points_awarded = excluded.points_awarded
            WHERE team_block_states.is_complete = 0
            "#,
        )
        .bind(team_code.as_str())
        .bind(state.block_id.to_string())
        .bind(player_data)
        .bind(state.is_complete)
        .bind(state.points_awarded)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("block_state.record_validation", e))?;

        let completed = state.is_complete && written.rows_affected() == 1;
        if completed && team_points != 0 {
            let awarded = sqlx::query("UPDATE teams SET points = points + ? WHERE code = ?")
                .bind(team_points)
                .bind(team_code.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::database("block_state.record_validation", e))?;
            if awarded.rows_affected() == 0 {
                return Err(RepoError::not_found("Team", team_code));
            }
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("block_state.record_validation", e))?;
        Ok(completed)
    }
}
