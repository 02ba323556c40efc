//! SQLite adapters for the repository ports.
//!
//! The schema is created on connect with `IF NOT EXISTS` statements; there
//! is no migration history. Ids are stored as TEXT uuids, timestamps as
//! TEXT via sqlx's chrono support, and enums through their `as_str` form.

mod block_repo;
mod block_state_repo;
mod check_in_repo;
mod instance_repo;
mod location_repo;
mod rows;
mod team_repo;


use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::RepoError;

pub use block_repo::SqliteBlockRepo;
pub use block_state_repo::SqliteBlockStateRepo;
pub use check_in_repo::SqliteCheckInRepo;
pub use instance_repo::SqliteInstanceRepo;
pub use location_repo::SqliteLocationRepo;
pub use team_repo::SqliteTeamRepo;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS instances (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        start_time TEXT,
        end_time TEXT,
        navigation_mode TEXT NOT NULL,
        navigation_method TEXT NOT NULL,
        completion_method TEXT NOT NULL,
        max_next_locations INTEGER NOT NULL,
        enable_points INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id TEXT PRIMARY KEY,
        instance_id TEXT NOT NULL,
        name TEXT NOT NULL,
        marker_code TEXT NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0,
        points INTEGER NOT NULL DEFAULT 0,
        clue TEXT,
        total_visits INTEGER NOT NULL DEFAULT 0,
        current_count INTEGER NOT NULL DEFAULT 0,
        avg_duration REAL NOT NULL DEFAULT 0
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_locations_marker ON locations (instance_id, marker_code)",
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id TEXT PRIMARY KEY,
        code TEXT NOT NULL,
        instance_id TEXT NOT NULL,
        name TEXT,
        points INTEGER NOT NULL DEFAULT 0,
        has_started INTEGER NOT NULL DEFAULT 0,
        must_check_out TEXT
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_teams_code ON teams (code)",
    "CREATE INDEX IF NOT EXISTS idx_teams_instance ON teams (instance_id)",
    r#"
    CREATE TABLE IF NOT EXISTS check_ins (
        team_code TEXT NOT NULL,
        location_id TEXT NOT NULL,
        instance_id TEXT NOT NULL,
        time_in TEXT NOT NULL,
        time_out TEXT,
        must_check_out INTEGER NOT NULL DEFAULT 0,
        blocks_completed INTEGER NOT NULL DEFAULT 1,
        points INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_check_ins_team_location ON check_ins (team_code, location_id)",
    "CREATE INDEX IF NOT EXISTS idx_check_ins_location ON check_ins (location_id)",
    r#"
    CREATE TABLE IF NOT EXISTS blocks (
        id TEXT PRIMARY KEY,
        location_id TEXT NOT NULL,
        block_type TEXT NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0,
        points INTEGER NOT NULL DEFAULT 0,
        data TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_blocks_location ON blocks (location_id)",
    r#"
    CREATE TABLE IF NOT EXISTS team_block_states (
        team_code TEXT NOT NULL,
        block_id TEXT NOT NULL,
        player_data TEXT NOT NULL,
        is_complete INTEGER NOT NULL DEFAULT 0,
        points_awarded INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_block_states_team_block ON team_block_states (team_code, block_id)",
];

/// All SQLite repositories sharing one pool.
pub struct SqliteRepositories {
    pub pool: SqlitePool,
    pub instance: Arc<SqliteInstanceRepo>,
    pub location: Arc<SqliteLocationRepo>,
    pub team: Arc<SqliteTeamRepo>,
    pub check_in: Arc<SqliteCheckInRepo>,
    pub block: Arc<SqliteBlockRepo>,
    pub block_state: Arc<SqliteBlockStateRepo>,
}

impl SqliteRepositories {
    /// Open (creating if missing) the database at `database_url` and ensure the schema.
    pub async fn connect(database_url: &str) -> Result<Self, RepoError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| RepoError::database("connect", e))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| RepoError::database("connect", e))?;

        ensure_schema(&pool).await?;
        tracing::info!(database_url = %database_url, "SQLite schema ready");

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            instance: Arc::new(SqliteInstanceRepo::new(pool.clone())),
            location: Arc::new(SqliteLocationRepo::new(pool.clone())),
            team: Arc::new(SqliteTeamRepo::new(pool.clone())),
            check_in: Arc::new(SqliteCheckInRepo::new(pool.clone())),
            block: Arc::new(SqliteBlockRepo::new(pool.clone())),
            block_state: Arc::new(SqliteBlockStateRepo::new(pool.clone())),
            pool,
        }
    }
}

async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("schema", e))?;
    }
    Ok(())
}

/// Whether `err` is a UNIQUE index violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
