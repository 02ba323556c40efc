//! Team provisioning: generating join codes in bulk, resetting and
//! removing teams.

use std::collections::HashSet;
use std::sync::Arc;

use scanquest_domain::{DomainError, InstanceId, Team, TeamCode};

use crate::infrastructure::ports::{InstanceRepo, LocationRepo, RandomPort, RepoError, TeamRepo};

/// Teams inserted per transaction
pub const BATCH_SIZE: usize = 100;

/// Uppercase letters and digits without the easily confused `I`, `O`, `0`, `1`
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const DEFAULT_CODE_LENGTH: usize = 4;

/// Re-inserts of one batch after a stored code collided
const MAX_INSERT_RETRIES: u32 = 10;

/// Draws for one fresh code before the code space counts as exhausted
const MAX_CODE_DRAWS: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum TeamProvisioningError {
    #[error("Instance not found")]
    InstanceNotFound,
    #[error("Team not found")]
    TeamNotFound,
    #[error("Could not find unused team codes of length {0}")]
    CodeSpaceExhausted(usize),
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub struct TeamProvisioning {
    instance: Arc<dyn InstanceRepo>,
    location: Arc<dyn LocationRepo>,
    team: Arc<dyn TeamRepo>,
    random: Arc<dyn RandomPort>,
    code_length: usize,
}

impl TeamProvisioning {
    pub fn new(
        instance: Arc<dyn InstanceRepo>,
        location: Arc<dyn LocationRepo>,
        team: Arc<dyn TeamRepo>,
        random: Arc<dyn RandomPort>,
        code_length: usize,
    ) -> Self {
        Self {
            instance,
            location,
            team,
            random,
            code_length: code_length.max(1),
        }
    }

    pub async fn list(&self, instance_id: InstanceId) -> Result<Vec<Team>, TeamProvisioningError> {
        Ok(self.team.list_in_instance(instance_id).await?)
    }

    /// Create `count` teams with fresh codes.
    ///
    /// Codes are unique within each batch before insertion. A code that
    /// already exists in storage is redrawn and the batch re-inserted.
    pub async fn add_teams(
        &self,
        instance_id: InstanceId,
        count: usize,
    ) -> Result<Vec<Team>, TeamProvisioningError> {
        if self.instance.get(instance_id).await?.is_none() {
            return Err(TeamProvisioningError::InstanceNotFound);
        }

        let mut created = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining > 0 {
            let size = remaining.min(BATCH_SIZE);
            let batch = self.insert_batch(instance_id, size).await?;
            created.extend(batch);
            remaining -= size;
        }

        tracing::info!(instance_id = %instance_id, count, "Provisioned teams");
        Ok(created)
    }

    async fn insert_batch(
        &self,
        instance_id: InstanceId,
        size: usize,
    ) -> Result<Vec<Team>, TeamProvisioningError> {
        let mut codes = HashSet::with_capacity(size);
        let mut teams = Vec::with_capacity(size);
        for _ in 0..size {
            let code = self.fresh_code(&codes)?;
            codes.insert(code.clone());
            teams.push(Team::new(instance_id, code));
        }

        let mut retries = 0;
        loop {
            let err = match self.team.insert_batch(&teams).await {
                Ok(()) => return Ok(teams),
                Err(e) => e,
            };
            let Some(taken) = err.conflict_key("Team").map(str::to_string) else {
                return Err(err.into());
            };

            retries += 1;
            if retries > MAX_INSERT_RETRIES {
                return Err(TeamProvisioningError::CodeSpaceExhausted(self.code_length));
            }
            tracing::warn!(code = %taken, retries, "Team code already in use, drawing another");

            let replacement = self.fresh_code(&codes)?;
            codes.insert(replacement.clone());
            if let Some(team) = teams.iter_mut().find(|t| t.code.as_str() == taken) {
                team.code = replacement;
            }
        }
    }

    /// Draw a code not in `taken`.
    fn fresh_code(&self, taken: &HashSet<TeamCode>) -> Result<TeamCode, TeamProvisioningError> {
        for _ in 0..MAX_CODE_DRAWS {
            let code = self.draw_code()?;
            if !taken.contains(&code) {
                return Ok(code);
            }
        }
        Err(TeamProvisioningError::CodeSpaceExhausted(self.code_length))
    }

    fn draw_code(&self) -> Result<TeamCode, TeamProvisioningError> {
        let max = CODE_ALPHABET.len() as i32 - 1;
        let code: String = (0..self.code_length)
            .map(|_| {
                let i = self.random.gen_range(0, max).clamp(0, max) as usize;
                char::from(CODE_ALPHABET[i])
            })
            .collect();
        Ok(TeamCode::new(code)?)
    }

    /// Wipe the teams' progress, then rebuild the instance's location statistics.
    pub async fn reset(
        &self,
        instance_id: InstanceId,
        codes: Vec<TeamCode>,
    ) -> Result<(), TeamProvisioningError> {
        let count = codes.len();
        self.team.reset(instance_id, codes).await.map_err(|e| {
            if e.is_not_found() {
                TeamProvisioningError::TeamNotFound
            } else {
                TeamProvisioningError::Repo(e)
            }
        })?;
        self.location.recompute_statistics(instance_id).await?;
        tracing::info!(instance_id = %instance_id, count, "Reset teams");
        Ok(())
    }

    /// Remove a team and its progress, then rebuild location statistics.
    pub async fn delete(
        &self,
        instance_id: InstanceId,
        code: &TeamCode,
    ) -> Result<(), TeamProvisioningError> {
        self.team.delete(instance_id, code).await.map_err(|e| {
            if e.is_not_found() {
                TeamProvisioningError::TeamNotFound
            } else {
                TeamProvisioningError::Repo(e)
            }
        })?;
        self.location.recompute_statistics(instance_id).await?;
        tracing::info!(instance_id = %instance_id, team_code = %code, "Deleted team");
        Ok(())
    }
}
