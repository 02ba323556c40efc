use async_trait::async_trait;
use scanquest_domain::{InstanceId, Team, TeamCode, TeamName};
use sqlx::SqlitePool;

use super::is_unique_violation;
use super::rows::TeamRow;
use crate::infrastructure::ports::{RepoError, TeamRepo};

pub struct SqliteTeamRepo {
    pool: SqlitePool,
}

impl SqliteTeamRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const TEAM_COLUMNS: &str = "id, code, instance_id, name, points, has_started, must_check_out";

/// Progress rows owned by a team
const DELETE_PROGRESS: &[&str] = &[
    "DELETE FROM team_block_states WHERE team_code = ?",
    "DELETE FROM check_ins WHERE team_code = ?",
];

#[async_trait]
impl TeamRepo for SqliteTeamRepo {
    async fn get_by_code(&self, code: &TeamCode) -> Result<Option<Team>, RepoError> {
        let row = sqlx::query_as::<_, TeamRow>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE code = ?"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("team.get_by_code", e))?;

        row.map(Team::try_from).transpose()
    }

    async fn list_in_instance(&self, instance_id: InstanceId) -> Result<Vec<Team>, RepoError> {
        let rows = sqlx::query_as::<_, TeamRow>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE instance_id = ? ORDER BY code"
        ))
        .bind(instance_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("team.list_in_instance", e))?;

        rows.into_iter().map(Team::try_from).collect()
    }

    async fn insert_batch(&self, teams: &[Team]) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("team.insert_batch", e))?;

        for team in teams {
            sqlx::query(
                r#"
                INSERT INTO teams (id, code, instance_id, name, points, has_started, must_check_out)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(team.id.to_string())
            .bind(team.code.as_str())
            .bind(team.instance_id.to_string())
            .bind(team.name.as_ref().map(|n| n.as_str()))
            .bind(team.points)
            .bind(team.has_started)
            .bind(team.must_check_out.as_ref().map(|m| m.as_str()))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepoError::conflict("Team", team.code.as_str())
                } else {
                    RepoError::database("team.insert_batch", e)
                }
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("team.insert_batch", e))
    }

    async fn start(&self, code: &TeamCode, name: Option<TeamName>) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE teams SET has_started = 1, name = COALESCE(?, name) WHERE code = ?",
        )
        .bind(name.as_ref().map(|n| n.as_str()))
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("team.start", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Team", code));
        }
        Ok(())
    }

    async fn reset(&self, instance_id: InstanceId, codes: Vec<TeamCode>) -> Result<(), RepoError> {
        let instance_id = instance_id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("team.reset", e))?;

        for code in &codes {
            let reset = sqlx::query(
                r#"
                UPDATE teams
                SET name = NULL, points = 0, has_started = 0, must_check_out = NULL
                WHERE code = ? AND instance_id = ?
                "#,
            )
            .bind(code.as_str())
            .bind(&instance_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("team.reset", e))?;
            if reset.rows_affected() == 0 {
                return Err(RepoError::not_found("Team", code));
            }

            for statement in DELETE_PROGRESS {
                sqlx::query(statement)
                    .bind(code.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepoError::database("team.reset", e))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("team.reset", e))
    }

    async fn delete(&self, instance_id: InstanceId, code: &TeamCode) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("team.delete", e))?;

        let deleted = sqlx::query("DELETE FROM teams WHERE code = ? AND instance_id = ?")
            .bind(code.as_str())
            .bind(instance_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("team.delete", e))?;
        if deleted.rows_affected() == 0 {
            return Err(RepoError::not_found("Team", code));
        }

        for statement in DELETE_PROGRESS {
            sqlx::query(statement)
                .bind(code.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::database("team.delete", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("team.delete", e))
    }
}
