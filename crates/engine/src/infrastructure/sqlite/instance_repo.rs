use async_trait::async_trait;
use scanquest_domain::{Instance, InstanceId};
use sqlx::SqlitePool;

use super::rows::InstanceRow;
use crate::infrastructure::ports::{InstanceRepo, RepoError};

pub struct SqliteInstanceRepo {
    pool: SqlitePool,
}

impl SqliteInstanceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Child rows first; nothing references `instances` but the instance id itself.
const DELETE_INSTANCE: &[&str] = &[
    r#"
    DELETE FROM team_block_states WHERE block_id IN (
        SELECT b.id FROM blocks b
        JOIN locations l ON l.id = b.location_id
        WHERE l.instance_id = ?
    )
    "#,
    "DELETE FROM team_block_states WHERE team_code IN (SELECT code FROM teams WHERE instance_id = ?)",
    "DELETE FROM check_ins WHERE instance_id = ?",
    "DELETE FROM blocks WHERE location_id IN (SELECT id FROM locations WHERE instance_id = ?)",
    "DELETE FROM locations WHERE instance_id = ?",
    "DELETE FROM teams WHERE instance_id = ?",
];

#[async_trait]
impl InstanceRepo for SqliteInstanceRepo {
    async fn get(&self, id: InstanceId) -> Result<Option<Instance>, RepoError> {
        let row = sqlx::query_as::<_, InstanceRow>(
            r#"
            SELECT id, name, start_time, end_time, navigation_mode, navigation_method,
                   completion_method, max_next_locations, enable_points
            FROM instances WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("instance.get", e))?;

        row.map(Instance::try_from).transpose()
    }

    async fn save(&self, instance: &Instance) -> Result<(), RepoError> {
        let settings = &instance.settings;
        sqlx::query(
            r#"
            INSERT INTO instances (id, name, start_time, end_time, navigation_mode,
                                   navigation_method, completion_method,
                                   max_next_locations, enable_points)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                start_time = excluded.start_time,
                end_time = excluded.end_time,
                navigation_mode = excluded.navigation_mode,
                navigation_method = excluded.navigation_method,
                completion_method = excluded.completion_method,
                max_next_locations = excluded.max_next_locations,
                enable_points = excluded.enable_points
            "#,
        )
        .bind(instance.id.to_string())
        .bind(instance.name.as_str())
        .bind(instance.start_time)
        .bind(instance.end_time)
        .bind(settings.navigation_mode.as_str())
        .bind(settings.navigation_method.as_str())
        .bind(settings.completion_method.as_str())
        .bind(i64::from(settings.max_next_locations()))
        .bind(settings.enable_points)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("instance.save", e))?;

        Ok(())
    }

    async fn delete(&self, id: InstanceId) -> Result<(), RepoError> {
        let id = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("instance.delete", e))?;

        for statement in DELETE_INSTANCE {
            sqlx::query(statement)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::database("instance.delete", e))?;
        }

        let deleted = sqlx::query("DELETE FROM instances WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("instance.delete", e))?;
        if deleted.rows_affected() == 0 {
            return Err(RepoError::not_found("Instance", id));
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("instance.delete", e))
    }
}
