//! Gameplay orchestration: the player-facing check-in, check-out, and
//! block flows, combining navigation, the ledger, and block validation.

mod error;
mod flash;


pub use error::{ErrorClass, GameplayError};
pub use flash::{FlashLevel, FlashMessage};

use std::sync::Arc;

use scanquest_domain::{
    Block, BlockId, BlockInput, CheckIn, GameStatus, Instance, InstanceId, Location, MarkerCode,
    NavigationMethod, Team, TeamBlockState, TeamCode, TeamName,
};

use crate::infrastructure::ports::{ClockPort, InstanceRepo, LocationRepo, TeamRepo};
use crate::use_cases::blocks::BlockService;
use crate::use_cases::ledger::{CheckInLedger, LedgerError, Visit, VisitRules};
use crate::use_cases::navigation::{NavigationError, NavigationSelector};

#[derive(Debug)]
pub struct CheckInOutcome {
    pub location: Location,
    pub check_in: CheckIn,
    pub flash: Vec<FlashMessage>,
}

#[derive(Debug)]
pub struct CheckOutOutcome {
    pub location: Location,
    pub check_in: CheckIn,
    pub flash: Vec<FlashMessage>,
}

/// Where a team can go from here
#[derive(Debug)]
pub enum NextLocations {
    Suggestions {
        navigation_method: NavigationMethod,
        locations: Vec<Location>,
    },
    /// Every location has been visited
    Finished,
    /// The team has to check out of this location before moving on
    CheckOutFirst(Location),
}

#[derive(Debug)]
pub struct BlockOutcome {
    pub block: Box<dyn Block>,
    pub state: TeamBlockState,
}

pub struct Gameplay {
    instance: Arc<dyn InstanceRepo>,
    location: Arc<dyn LocationRepo>,
    team: Arc<dyn TeamRepo>,
    navigation: Arc<NavigationSelector>,
    ledger: Arc<CheckInLedger>,
    blocks: Arc<BlockService>,
    clock: Arc<dyn ClockPort>,
}

impl Gameplay {
    pub fn new(
        instance: Arc<dyn InstanceRepo>,
        location: Arc<dyn LocationRepo>,
        team: Arc<dyn TeamRepo>,
        navigation: Arc<NavigationSelector>,
        ledger: Arc<CheckInLedger>,
        blocks: Arc<BlockService>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            instance,
            location,
            team,
            navigation,
            ledger,
            blocks,
            clock,
        }
    }

    /// Resolve the session's team. Codes are compared trimmed and uppercased.
    pub async fn team_by_code(&self, raw: &str) -> Result<Team, GameplayError> {
        let result = match TeamCode::new(raw) {
            Ok(code) => self
                .team
                .get_by_code(&code)
                .await
                .map_err(GameplayError::from)
                .and_then(|team| team.ok_or(GameplayError::TeamNotFound)),
            Err(_) => Err(GameplayError::TeamNotFound),
        };
        result.inspect_err(|e| e.log("team_by_code", raw.trim()))
    }

    /// Mark the team as playing, optionally under a chosen display name.
    /// Only the name and started flag are written.
    pub async fn start_playing(
        &self,
        raw_code: &str,
        team_name: Option<&str>,
    ) -> Result<Team, GameplayError> {
        let mut team = self.team_by_code(raw_code).await?;
        let name = team_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(TeamName::new)
            .transpose()
            .map_err(|e| GameplayError::InvalidInput(e.to_string()))
            .inspect_err(|e| e.log("start_playing", team.code.as_str()))?;

        if team.has_started && name.is_none() {
            return Ok(team);
        }
        self.team
            .start(&team.code, name.clone())
            .await
            .map_err(GameplayError::from)
            .inspect_err(|e| e.log("start_playing", team.code.as_str()))?;
        match name {
            Some(name) => team.start(name),
            None => team.has_started = true,
        }

        tracing::info!(team_code = %team.code, "Team started playing");
        Ok(team)
    }

    pub async fn game_status(&self, team: &Team) -> Result<GameStatus, GameplayError> {
        let instance = self
            .load_instance(team)
            .await
            .inspect_err(|e| e.log("game_status", team.code.as_str()))?;
        Ok(instance.status(self.clock.now()))
    }

    /// Scan in at the location with `scan_code`.
    pub async fn check_in(
        &self,
        team: &Team,
        scan_code: &str,
    ) -> Result<CheckInOutcome, GameplayError> {
        self.run_check_in(team, scan_code)
            .await
            .inspect_err(|e| e.log("check_in", team.code.as_str()))
    }

    async fn run_check_in(
        &self,
        team: &Team,
        scan_code: &str,
    ) -> Result<CheckInOutcome, GameplayError> {
        let instance = self.load_instance(team).await?;
        let status = instance.status(self.clock.now());
        if status != GameStatus::Active {
            return Err(GameplayError::GameNotActive(status));
        }

        if let Some(occupied) = &team.must_check_out {
            if !occupied.matches(scan_code) {
                return Err(GameplayError::OccupiedElsewhere {
                    location: self.location_label(team.instance_id, occupied).await?,
                });
            }
        }

        let location = self.resolve_location(team.instance_id, scan_code).await?;
        if team.occupies(&location.marker_code) {
            return Err(GameplayError::MustCheckOutHere {
                location: location.name.to_string(),
            });
        }
        if self
            .ledger
            .has_visited(&team.code, location.id)
            .await
            .map_err(|e| ledger_error(e, &location))?
        {
            return Err(GameplayError::AlreadyCheckedIn);
        }

        self.navigation.check_valid_location(team, scan_code).await?;

        let validation_required = self
            .blocks
            .validation_required_for_location(location.id)
            .await?;
        let rules = VisitRules {
            must_check_out: instance.settings.completion_method.requires_check_out(),
            validation_required,
            award_points: instance.settings.enable_points,
        };
        let check_in = self
            .ledger
            .check_in(team, &location, rules)
            .await
            .map_err(|e| ledger_error(e, &location))?;

        let mut flash = vec![FlashMessage::success("Checked in")
            .with_message(format!("Welcome to {}.", location.name))];
        if validation_required {
            flash.push(
                FlashMessage::info("There's something to do here")
                    .with_message("Complete the activities at this location."),
            );
        }
        if rules.must_check_out {
            flash.push(
                FlashMessage::info("Remember to check out")
                    .with_message("Scan the code again when you leave."),
            );
        }

        Ok(CheckInOutcome {
            location,
            check_in,
            flash,
        })
    }

    /// Scan out of the location the team occupies.
    pub async fn check_out(
        &self,
        team: &Team,
        scan_code: &str,
    ) -> Result<CheckOutOutcome, GameplayError> {
        self.run_check_out(team, scan_code)
            .await
            .inspect_err(|e| e.log("check_out", team.code.as_str()))
    }

    async fn run_check_out(
        &self,
        team: &Team,
        scan_code: &str,
    ) -> Result<CheckOutOutcome, GameplayError> {
        let instance = self.load_instance(team).await?;
        let location = self.resolve_location(team.instance_id, scan_code).await?;

        match &team.must_check_out {
            None => return Err(GameplayError::UnnecessaryCheckOut),
            Some(occupied) if *occupied != location.marker_code => {
                return Err(GameplayError::NotAllowedToCheckOut {
                    location: self.location_label(team.instance_id, occupied).await?,
                });
            }
            Some(_) => {}
        }

        if self
            .blocks
            .validation_outstanding(location.id, &team.code)
            .await?
        {
            return Err(GameplayError::UnfinishedCheckIn);
        }

        let check_in = self
            .ledger
            .check_out(team, &location, instance.settings.enable_points)
            .await
            .map_err(|e| ledger_error(e, &location))?;

        let flash = vec![FlashMessage::success("Checked out")
            .with_message(format!("Thanks for visiting {}.", location.name))];
        Ok(CheckOutOutcome {
            location,
            check_in,
            flash,
        })
    }

    /// Suggestions for the team's next move. Finishing the course is a
    /// state, not an error.
    pub async fn suggest_next_locations(
        &self,
        team: &Team,
    ) -> Result<NextLocations, GameplayError> {
        self.run_suggest(team)
            .await
            .inspect_err(|e| e.log("suggest_next_locations", team.code.as_str()))
    }

    async fn run_suggest(&self, team: &Team) -> Result<NextLocations, GameplayError> {
        let instance = self.load_instance(team).await?;

        if let Some(occupied) = &team.must_check_out {
            if let Some(location) = self
                .location
                .find_by_marker(team.instance_id, occupied)
                .await?
            {
                return Ok(NextLocations::CheckOutFirst(location));
            }
        }

        match self.navigation.determine_next_locations(team).await {
            Ok(locations) => Ok(NextLocations::Suggestions {
                navigation_method: instance.settings.navigation_method,
                locations,
            }),
            Err(NavigationError::AllLocationsVisited) => {
                tracing::debug!(team_code = %team.code, "Team has visited every location");
                Ok(NextLocations::Finished)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validate player input against a block at the location the team is
    /// checked in at. Points for the block are awarded once, and the visit
    /// is marked complete when no required block remains.
    pub async fn validate_and_update_block_state(
        &self,
        team: &Team,
        block_id: BlockId,
        input: &BlockInput,
    ) -> Result<BlockOutcome, GameplayError> {
        self.run_validate(team, block_id, input)
            .await
            .inspect_err(|e| e.log("validate_block", team.code.as_str()))
    }

    async fn run_validate(
        &self,
        team: &Team,
        block_id: BlockId,
        input: &BlockInput,
    ) -> Result<BlockOutcome, GameplayError> {
        let block = self.blocks.get(block_id).await?;
        let location_id = block.location_id();

        let visiting = self
            .ledger
            .find(&team.code, location_id)
            .await
            .map_err(ledger_repo_error)?
            .is_some_and(|c| c.is_open());
        if !visiting {
            return Err(GameplayError::NotCheckedInHere);
        }

        let state = self.blocks.state_for(block_id, &team.code).await?;
        if state.is_complete {
            return Ok(BlockOutcome { block, state });
        }

        let instance = self.load_instance(team).await?;
        let validation = self
            .blocks
            .validate_and_update_state(
                block.as_ref(),
                state,
                input,
                instance.settings.enable_points,
            )
            .await?;
        let state = validation.state;
        if !validation.completed_now {
            return Ok(BlockOutcome { block, state });
        }
        tracing::info!(
            team_code = %team.code,
            block_id = %block_id,
            points = state.points_awarded,
            "Block completed"
        );

        if !self
            .blocks
            .validation_outstanding(location_id, &team.code)
            .await?
        {
            self.ledger
                .complete_blocks(&team.code, location_id)
                .await
                .map_err(ledger_repo_error)?;
        }

        Ok(BlockOutcome { block, state })
    }

    /// Try a block out as an admin. Nothing is persisted.
    pub async fn preview_block(
        &self,
        block_id: BlockId,
        input: &BlockInput,
    ) -> Result<BlockOutcome, GameplayError> {
        let block = self.blocks.get(block_id).await?;
        let validation = self
            .blocks
            .validate_and_update_state(
                block.as_ref(),
                self.blocks.preview_state(block_id),
                input,
                false,
            )
            .await?;
        Ok(BlockOutcome {
            block,
            state: validation.state,
        })
    }

    pub async fn history(&self, team: &Team) -> Result<Vec<Visit>, GameplayError> {
        self.ledger
            .history(team)
            .await
            .map_err(ledger_repo_error)
            .inspect_err(|e| e.log("history", team.code.as_str()))
    }

    async fn load_instance(&self, team: &Team) -> Result<Instance, GameplayError> {
        self.instance
            .get(team.instance_id)
            .await?
            .ok_or(GameplayError::InstanceNotFound)
    }

    async fn resolve_location(
        &self,
        instance_id: InstanceId,
        scan_code: &str,
    ) -> Result<Location, GameplayError> {
        let not_found = || GameplayError::LocationNotFound {
            code: scan_code.trim().to_uppercase(),
        };
        let marker = MarkerCode::new(scan_code).map_err(|_| not_found())?;
        self.location
            .find_by_marker(instance_id, &marker)
            .await?
            .ok_or_else(not_found)
    }

    /// Display name for an occupied marker, or the marker itself if the
    /// location is gone.
    async fn location_label(
        &self,
        instance_id: InstanceId,
        marker: &MarkerCode,
    ) -> Result<String, GameplayError> {
        Ok(self
            .location
            .find_by_marker(instance_id, marker)
            .await?
            .map(|l| l.name.to_string())
            .unwrap_or_else(|| marker.to_string()))
    }
}

fn ledger_error(e: LedgerError, location: &Location) -> GameplayError {
    match e {
        LedgerError::OccupiedElsewhere { marker } => {
            GameplayError::OccupiedElsewhere { location: marker }
        }
        LedgerError::MustCheckOutHere => GameplayError::MustCheckOutHere {
            location: location.name.to_string(),
        },
        LedgerError::AlreadyCheckedIn => GameplayError::AlreadyCheckedIn,
        LedgerError::NoOpenCheckIn | LedgerError::CheckInNotFound => {
            GameplayError::NotCheckedInHere
        }
        LedgerError::Repo(e) => GameplayError::Repo(e),
    }
}

/// Ledger failures outside check-in/out carry no location context
fn ledger_repo_error(e: LedgerError) -> GameplayError {
    match e {
        LedgerError::Repo(e) => GameplayError::Repo(e),
        LedgerError::AlreadyCheckedIn => GameplayError::AlreadyCheckedIn,
        LedgerError::OccupiedElsewhere { marker } => {
            GameplayError::OccupiedElsewhere { location: marker }
        }
        LedgerError::MustCheckOutHere
        | LedgerError::NoOpenCheckIn
        | LedgerError::CheckInNotFound => GameplayError::NotCheckedInHere,
    }
}
