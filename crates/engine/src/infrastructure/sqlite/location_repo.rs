use async_trait::async_trait;
use scanquest_domain::{
    folded_average, CheckIn, InstanceId, Location, LocationId, LocationStats, MarkerCode,
};
use sqlx::SqlitePool;
use std::collections::HashMap;

use super::is_unique_violation;
use super::rows::{CheckInRow, LocationRow};
use crate::infrastructure::ports::{LocationRepo, RepoError};

pub struct SqliteLocationRepo {
    pool: SqlitePool,
}

impl SqliteLocationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const LOCATION_COLUMNS: &str = "id, instance_id, name, marker_code, sort_order, points, clue, \
     total_visits, current_count, avg_duration";

/// Statistics for one location, rebuilt from its check-ins
fn stats_from(check_ins: &[CheckIn]) -> LocationStats {
    let mut stats = LocationStats::default();
    let mut closed = 0;
    for check_in in check_ins {
        stats.total_visits += 1;
        match check_in.duration_secs() {
            Some(secs) => {
                stats.avg_duration = folded_average(stats.avg_duration, closed, secs);
                closed += 1;
            }
            None => stats.current_count += 1,
        }
    }
    stats
}

#[async_trait]
impl LocationRepo for SqliteLocationRepo {
    async fn get(&self, id: LocationId) -> Result<Option<Location>, RepoError> {
        let row = sqlx::query_as::<_, LocationRow>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("location.get", e))?;

        row.map(Location::try_from).transpose()
    }

    async fn list_in_instance(&self, instance_id: InstanceId) -> Result<Vec<Location>, RepoError> {
        let rows = sqlx::query_as::<_, LocationRow>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE instance_id = ? ORDER BY sort_order, id"
        ))
        .bind(instance_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("location.list_in_instance", e))?;

        rows.into_iter().map(Location::try_from).collect()
    }

    async fn find_by_marker(
        &self,
        instance_id: InstanceId,
        marker: &MarkerCode,
    ) -> Result<Option<Location>, RepoError> {
        let row = sqlx::query_as::<_, LocationRow>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE instance_id = ? AND marker_code = ?"
        ))
        .bind(instance_id.to_string())
        .bind(marker.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("location.find_by_marker", e))?;

        row.map(Location::try_from).transpose()
    }

    async fn save(&self, location: &Location) -> Result<(), RepoError> {
        // Statistics are owned by the check-in transactions; an update leaves them alone
        sqlx::query(
            r#"
            INSERT INTO locations (id, instance_id, name, marker_code, sort_order, points, clue,
                                   total_visits, current_count, avg_duration)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                marker_code = excluded.marker_code,
                sort_order = excluded.sort_order,
                points = excluded.points,
                clue = excluded.clue
            "#,
        )
        .bind(location.id.to_string())
        .bind(location.instance_id.to_string())
        .bind(location.name.as_str())
        .bind(location.marker_code.as_str())
        .bind(location.order)
        .bind(location.points)
        .bind(location.clue.as_deref())
        .bind(i64::from(location.stats.total_visits))
        .bind(i64::from(location.stats.current_count))
        .bind(location.stats.avg_duration)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::conflict("Location", location.marker_code.as_str())
            } else {
                RepoError::database("location.save", e)
            }
        })?;

        Ok(())
    }

    async fn delete(&self, id: LocationId) -> Result<(), RepoError> {
        let location = self
            .get(id)
            .await?
            .ok_or_else(|| RepoError::not_found("Location", id))?;
        let id = id.to_string();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("location.delete", e))?;

        let statements = [
            "DELETE FROM team_block_states WHERE block_id IN (SELECT id FROM blocks WHERE location_id = ?)",
            "DELETE FROM blocks WHERE location_id = ?",
            "DELETE FROM check_ins WHERE location_id = ?",
            "DELETE FROM locations WHERE id = ?",
        ];
        for statement in statements {
            sqlx::query(statement)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepoError::database("location.delete", e))?;
        }

        // Teams stuck at the removed location are released
        sqlx::query(
            "UPDATE teams SET must_check_out = NULL WHERE instance_id = ? AND must_check_out = ?",
        )
        .bind(location.instance_id.to_string())
        .bind(location.marker_code.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepoError::database("location.delete", e))?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("location.delete", e))
    }

    async fn recompute_statistics(&self, instance_id: InstanceId) -> Result<(), RepoError> {
        let instance_id = instance_id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("location.recompute_statistics", e))?;

        let location_ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM locations WHERE instance_id = ?")
                .bind(&instance_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| RepoError::database("location.recompute_statistics", e))?;

        let rows = sqlx::query_as::<_, CheckInRow>(
            r#"
            SELECT team_code, location_id, instance_id, time_in, time_out, must_check_out,
                   blocks_completed, points
            FROM check_ins WHERE instance_id = ?
            ORDER BY time_in
            "#,
        )
        .bind(&instance_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| RepoError::database("location.recompute_statistics", e))?;

        let mut by_location: HashMap<String, Vec<CheckIn>> = HashMap::new();
        for row in rows {
            let check_in = CheckIn::try_from(row)?;
            by_location
                .entry(check_in.location_id.to_string())
                .or_default()
                .push(check_in);
        }

        for location_id in location_ids {
            let stats = by_location
                .get(&location_id)
                .map(|c| stats_from(c.as_slice()))
                .unwrap_or_default();
            sqlx::query(
                "UPDATE locations SET total_visits = ?, current_count = ?, avg_duration = ? WHERE id = ?",
            )
            .bind(i64::from(stats.total_visits))
            .bind(i64::from(stats.current_count))
            .bind(stats.avg_duration)
            .bind(&location_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepoError::database("location.recompute_statistics", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("location.recompute_statistics", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use scanquest_domain::TeamCode;

    #[test]
    fn stats_use_exact_mean_of_closed_visits() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
        let location_id = LocationId::new();
        let instance_id = InstanceId::new();
        let visit = |code: &str, secs: Option<i64>| {
            let mut c = CheckIn::open(TeamCode::new(code).unwrap(), location_id, instance_id, start);
            c.time_out = secs.map(|s| start + Duration::seconds(s));
            c
        };

        let stats = stats_from(&[
            visit("AAAA", Some(60)),
            visit("BBBB", Some(120)),
            visit("CCCC", None),
        ]);

        assert_eq!(stats.total_visits, 3);
        assert_eq!(stats.current_count, 1);
        assert!((stats.avg_duration - 90.0).abs() < 1e-9);
    }
}
