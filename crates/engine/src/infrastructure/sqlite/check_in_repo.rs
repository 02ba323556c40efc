use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scanquest_domain::{CheckIn, LocationId, MarkerCode, TeamCode};
use sqlx::SqlitePool;

use super::is_unique_violation;
use super::rows::CheckInRow;
use crate::infrastructure::ports::{CheckInRepo, RepoError};

pub struct SqliteCheckInRepo {
    pool: SqlitePool,
}

impl SqliteCheckInRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const CHECK_IN_COLUMNS: &str = "team_code, location_id, instance_id, time_in, time_out, \
     must_check_out, blocks_completed, points";

#[async_trait]
impl CheckInRepo for SqliteCheckInRepo {
    async fn find(
        &self,
        team_code: &TeamCode,
        location_id: LocationId,
    ) -> Result<Option<CheckIn>, RepoError> {
        let row = sqlx::query_as::<_, CheckInRow>(&format!(
            "SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE team_code = ? AND location_id = ?"
        ))
        .bind(team_code.as_str())
        .bind(location_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("check_in.find", e))?;

        row.map(CheckIn::try_from).transpose()
    }

    async fn list_for_team(&self, team_code: &TeamCode) -> Result<Vec<CheckIn>, RepoError> {
        let rows = sqlx::query_as::<_, CheckInRow>(&format!(
            "SELECT {CHECK_IN_COLUMNS} FROM check_ins WHERE team_code = ? ORDER BY time_in"
        ))
        .bind(team_code.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("check_in.list_for_team", e))?;

        rows.into_iter().map(CheckIn::try_from).collect()
    }

    async fn record_check_in(
        &self,
        check_in: &CheckIn,
        occupy: Option<MarkerCode>,
        team_points: i32,
    ) -> Result<(), RepoError> {
        let team_code = check_in.team_code.as_str();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("check_in.record", e))?;

        // Claim the team first: the guarded write takes SQLite's write lock,
        // so a concurrent check-in for the same team waits and then sees the claim
        let claimed = sqlx::query(
            r#"
            UPDATE teams
            SET must_check_out = ?, points = points + ?
            WHERE code = ? AND must_check_out IS NULL
            "#,
        )
        .bind(occupy.as_ref().map(|m| m.as_str()))
        .bind(team_points)
        .bind(team_code)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("check_in.record", e))?;

        if claimed.rows_affected() == 0 {
            let occupied: Option<Option<String>> =
                sqlx::query_scalar("SELECT must_check_out FROM teams WHERE code = ?")
                    .bind(team_code)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| RepoError::database("check_in.record", e))?;
            // The conflict key is the marker the team still has to check out of
            return Err(match occupied {
                Some(marker) => RepoError::conflict("TeamOccupancy", marker.unwrap_or_default()),
                None => RepoError::not_found("Team", team_code),
            });
        }

        sqlx::query(&format!(
            "INSERT INTO check_ins ({CHECK_IN_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(team_code)
        .bind(check_in.location_id.to_string())
        .bind(check_in.instance_id.to_string())
        .bind(check_in.time_in)
        .bind(check_in.time_out)
        .bind(check_in.must_check_out)
        .bind(check_in.blocks_completed)
        .bind(check_in.points)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::conflict("CheckIn", format!("{team_code}/{}", check_in.location_id))
            } else {
                RepoError::database("check_in.record", e)
            }
        })?;

        let counted = sqlx::query(
            r#"
            UPDATE locations
            SET total_visits = total_visits + 1, current_count = current_count + 1
            WHERE id = ?
            "#,
        )
        .bind(check_in.location_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("check_in.record", e))?;
        if counted.rows_affected() == 0 {
            return Err(RepoError::not_found("Location", check_in.location_id));
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("check_in.record", e))
    }

    async fn record_check_out(
        &self,
        check_in: &CheckIn,
        duration_secs: f64,
        team_points: i32,
    ) -> Result<(), RepoError> {
        let team_code = check_in.team_code.as_str();
        let location_id = check_in.location_id.to_string();
        let time_out: DateTime<Utc> = check_in.time_out.unwrap_or(check_in.time_in);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("check_in.check_out", e))?;

        let closed = sqlx::query(
            r#"
            UPDATE check_ins
            SET time_out = ?, points = points + ?
            WHERE team_code = ? AND location_id = ? AND time_out IS NULL
            "#,
        )
        .bind(time_out)
        .bind(team_points)
        .bind(team_code)
        .bind(&location_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("check_in.check_out", e))?;
        if closed.rows_affected() == 0 {
            return Err(RepoError::not_found(
                "OpenCheckIn",
                format!("{team_code}/{location_id}"),
            ));
        }

        sqlx::query(
            r#"
            UPDATE locations
            SET avg_duration = (avg_duration * total_visits + ?) / (total_visits + 1),
                current_count = CASE WHEN current_count > 0 THEN current_count - 1 ELSE 0 END
            WHERE id = ?
            "#,
        )
        .bind(duration_secs)
        .bind(&location_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("check_in.check_out", e))?;

        sqlx::query("UPDATE teams SET must_check_out = NULL, points = points + ? WHERE code = ?")
            .bind(team_points)
            .bind(team_code)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("check_in.check_out", e))?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("check_in.check_out", e))
    }

    async fn mark_blocks_completed(
        &self,
        team_code: &TeamCode,
        location_id: LocationId,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE check_ins SET blocks_completed = 1
            WHERE team_code = ? AND location_id = ? AND blocks_completed = 0
            "#,
        )
        .bind(team_code.as_str())
        .bind(location_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("check_in.mark_blocks_completed", e))?;

        Ok(result.rows_affected() > 0)
    }
}
