use async_trait::async_trait;
use scanquest_domain::{BlockId, BlockRecord, LocationId};
use sqlx::SqlitePool;

use super::rows::BlockRow;
use crate::infrastructure::ports::{BlockRepo, RepoError};

pub struct SqliteBlockRepo {
    pool: SqlitePool,
}

impl SqliteBlockRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockRepo for SqliteBlockRepo {
    async fn get(&self, id: BlockId) -> Result<Option<BlockRecord>, RepoError> {
        let row = sqlx::query_as::<_, BlockRow>(
            "SELECT id, location_id, block_type, sort_order, points, data FROM blocks WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("block.get", e))?;

        row.map(BlockRecord::try_from).transpose()
    }

    async fn list_for_location(
        &self,
        location_id: LocationId,
    ) -> Result<Vec<BlockRecord>, RepoError> {
        let rows = sqlx::query_as::<_, BlockRow>(
            r#"
            SELECT id, location_id, block_type, sort_order, points, data
            FROM blocks WHERE location_id = ?
            ORDER BY sort_order, id
            "#,
        )
        .bind(location_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("block.list_for_location", e))?;

        rows.into_iter().map(BlockRecord::try_from).collect()
    }

    async fn save(&self, block: &BlockRecord) -> Result<(), RepoError> {
        let data = serde_json::to_string(&block.data).map_err(RepoError::serialization)?;
        sqlx::query(
            r#"
            INSERT INTO blocks (id, location_id, block_type, sort_order, points, data)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                sort_order = excluded.sort_order,
                points = excluded.points,
                data = excluded.data
            "#,
        )
        .bind(block.id.to_string())
        .bind(block.location_id.to_string())
        .bind(&block.block_type)
        .bind(block.order)
        .bind(block.points)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("block.save", e))?;

        Ok(())
    }

    async fn reorder(&self, location_id: LocationId, ids: Vec<BlockId>) -> Result<(), RepoError> {
        let location_id = location_id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("block.reorder", e))?;

        for (position, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE blocks SET sort_order = ? WHERE id = ? AND location_id = ?")
                .bind(position as i64)
                .bind(id.to_string())
                .bind(&location_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::database("block.reorder", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("block.reorder", e))
    }

    async fn delete(&self, id: BlockId) -> Result<(), RepoError> {
        let id = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("block.delete", e))?;

        sqlx::query("DELETE FROM team_block_states WHERE block_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("block.delete", e))?;

        let deleted = sqlx::query("DELETE FROM blocks WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("block.delete", e))?;
        if deleted.rows_affected() == 0 {
            return Err(RepoError::not_found("Block", id));
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("block.delete", e))
    }
}
