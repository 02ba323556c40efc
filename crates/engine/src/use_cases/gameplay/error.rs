//! Gameplay errors, their classification, and what the player is told.

use scanquest_domain::{BlockError, GameStatus};

use super::flash::FlashMessage;
use crate::infrastructure::ports::RepoError;
use crate::use_cases::blocks::BlockServiceError;
use crate::use_cases::navigation::NavigationError;

const DOUBLE_CHECK: &str = "Please double check the code and try again.";
const TRY_AGAIN: &str = "Something went wrong. Please try again.";

/// Broad category of a gameplay failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Unknown team, location, or block code
    NotFound,
    /// The team is tied to a location it has not checked out of
    Occupancy,
    /// The move is not one the team may make right now
    IneligibleMove,
    /// The game is over or unavailable for this team; control flow, not a fault
    Terminal,
    /// Storage failed
    Persistence,
    /// The request itself was unacceptable
    Invalid,
}

#[derive(Debug, thiserror::Error)]
pub enum GameplayError {
    #[error("Team not found")]
    TeamNotFound,
    #[error("Instance not found")]
    InstanceNotFound,
    #[error("Game is {0}")]
    GameNotActive(GameStatus),
    #[error("Location not found: {code}")]
    LocationNotFound { code: String },
    #[error("Block not found")]
    BlockNotFound,
    #[error("Team must check out of {location} first")]
    OccupiedElsewhere { location: String },
    #[error("Team is checked in at {location} and must check out")]
    MustCheckOutHere { location: String },
    #[error("Team is checked in at {location}, not here")]
    NotAllowedToCheckOut { location: String },
    #[error("Team has already checked in here")]
    AlreadyCheckedIn,
    #[error("Invalid next location")]
    InvalidNextLocation,
    #[error("Team is not checked in at this location")]
    NotCheckedInHere,
    #[error("All locations visited")]
    AllLocationsVisited,
    #[error("Team does not need to check out")]
    UnnecessaryCheckOut,
    #[error("Required blocks are unfinished")]
    UnfinishedCheckIn,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl GameplayError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::TeamNotFound | Self::LocationNotFound { .. } | Self::BlockNotFound => {
                ErrorClass::NotFound
            }
            Self::OccupiedElsewhere { .. }
            | Self::MustCheckOutHere { .. }
            | Self::NotAllowedToCheckOut { .. } => ErrorClass::Occupancy,
            Self::AlreadyCheckedIn | Self::InvalidNextLocation | Self::NotCheckedInHere => {
                ErrorClass::IneligibleMove
            }
            Self::AllLocationsVisited | Self::InstanceNotFound | Self::GameNotActive(_) => {
                ErrorClass::Terminal
            }
            Self::Repo(_) => ErrorClass::Persistence,
            Self::UnnecessaryCheckOut
            | Self::UnfinishedCheckIn
            | Self::InvalidInput(_)
            | Self::Block(_) => ErrorClass::Invalid,
        }
    }

    /// Stable machine-readable name
    pub fn code(&self) -> &'static str {
        match self {
            Self::TeamNotFound => "team_not_found",
            Self::InstanceNotFound => "instance_not_found",
            Self::GameNotActive(_) => "game_not_active",
            Self::LocationNotFound { .. } => "location_not_found",
            Self::BlockNotFound => "block_not_found",
            Self::OccupiedElsewhere { .. } => "occupied_elsewhere",
            Self::MustCheckOutHere { .. } => "must_check_out_here",
            Self::NotAllowedToCheckOut { .. } => "not_allowed_to_check_out",
            Self::AlreadyCheckedIn => "already_checked_in",
            Self::InvalidNextLocation => "invalid_next_location",
            Self::NotCheckedInHere => "not_checked_in_here",
            Self::AllLocationsVisited => "all_locations_visited",
            Self::UnnecessaryCheckOut => "unnecessary_check_out",
            Self::UnfinishedCheckIn => "unfinished_check_in",
            Self::InvalidInput(_) => "invalid_input",
            Self::Block(_) => "invalid_block_input",
            Self::Repo(_) => "internal",
        }
    }

    /// What the player sees. Storage details never reach the message.
    pub fn flash(&self) -> FlashMessage {
        match self {
            Self::TeamNotFound => FlashMessage::warning("Team not found").with_message(DOUBLE_CHECK),
            Self::LocationNotFound { .. } => {
                FlashMessage::warning("Location code not found").with_message(DOUBLE_CHECK)
            }
            Self::BlockNotFound => {
                FlashMessage::warning("Activity not found").with_message(DOUBLE_CHECK)
            }
            Self::InstanceNotFound => {
                FlashMessage::error("Game not found").with_message(DOUBLE_CHECK)
            }
            Self::GameNotActive(GameStatus::Scheduled) => FlashMessage::info(
                "The game hasn't started yet",
            )
            .with_message("Check back once the game begins."),
            Self::GameNotActive(_) => {
                FlashMessage::info("The game is closed").with_message("Thanks for playing!")
            }
            Self::OccupiedElsewhere { location } => FlashMessage::warning("Still checked in")
                .with_message(format!("You need to check out of {location} first.")),
            Self::MustCheckOutHere { location } => FlashMessage::info("Already checked in")
                .with_message(format!("Scan out at {location} when you're ready to leave.")),
            Self::NotAllowedToCheckOut { location } => FlashMessage::warning("Wrong location")
                .with_message(format!("You're checked in at {location}, not here.")),
            Self::AlreadyCheckedIn => FlashMessage::info("Already visited")
                .with_message("You've already checked in here."),
            Self::InvalidNextLocation => FlashMessage::warning("Nice try!")
                .with_message("That's not one of your next locations. Keep exploring."),
            Self::NotCheckedInHere => FlashMessage::warning("Not checked in")
                .with_message("Check in at this location first."),
            Self::AllLocationsVisited => FlashMessage::success("All done!")
                .with_message("You've visited every location."),
            Self::UnnecessaryCheckOut => FlashMessage::info("No need to check out")
                .with_message("You aren't checked in anywhere."),
            Self::UnfinishedCheckIn => FlashMessage::warning("Not finished yet")
                .with_message("Complete the activities here before checking out."),
            Self::InvalidInput(message) => FlashMessage::warning("Please try again")
                .with_message(message.clone()),
            Self::Block(e) => FlashMessage::warning("Please try again").with_message(e.to_string()),
            Self::Repo(_) => FlashMessage::error("Something went wrong").with_message(TRY_AGAIN),
        }
    }

    /// Log at the level the class calls for.
    pub fn log(&self, operation: &'static str, team_code: &str) {
        match self.class() {
            ErrorClass::Persistence => tracing::error!(
                error = %self,
                operation,
                team_code,
                "Gameplay operation failed"
            ),
            ErrorClass::Terminal => tracing::debug!(
                reason = %self,
                operation,
                team_code,
                "Gameplay reached a terminal state"
            ),
            _ => tracing::info!(
                reason = %self,
                operation,
                team_code,
                "Gameplay request refused"
            ),
        }
    }
}

impl From<NavigationError> for GameplayError {
    fn from(e: NavigationError) -> Self {
        match e {
            NavigationError::AllLocationsVisited => Self::AllLocationsVisited,
            NavigationError::InstanceNotFound => Self::InstanceNotFound,
            NavigationError::InvalidNextLocation => Self::InvalidNextLocation,
            NavigationError::Repo(e) => Self::Repo(e),
        }
    }
}

impl From<BlockServiceError> for GameplayError {
    fn from(e: BlockServiceError) -> Self {
        match e {
            BlockServiceError::BlockNotFound(_) => Self::BlockNotFound,
            BlockServiceError::Block(e) => Self::Block(e),
            BlockServiceError::Repo(e) => Self::Repo(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::gameplay::FlashLevel;

    #[test]
    fn terminal_states_are_not_faults() {
        assert_eq!(GameplayError::AllLocationsVisited.class(), ErrorClass::Terminal);
        assert_eq!(GameplayError::InstanceNotFound.class(), ErrorClass::Terminal);
        assert_eq!(
            GameplayError::from(NavigationError::AllLocationsVisited).class(),
            ErrorClass::Terminal
        );
    }

    #[test]
    fn persistence_failures_get_a_generic_message() {
        let err = GameplayError::from(RepoError::database("check_in.record", "disk I/O error"));
        assert_eq!(err.class(), ErrorClass::Persistence);
        let flash = err.flash();
        assert_eq!(flash.level, FlashLevel::Error);
        assert!(!flash.message.contains("disk"));
    }

    #[test]
    fn occupancy_message_names_the_blocking_location() {
        let err = GameplayError::OccupiedElsewhere {
            location: "Lighthouse".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::Occupancy);
        assert!(err.flash().message.contains("Lighthouse"));
    }

    #[test]
    fn not_found_asks_to_double_check() {
        let err = GameplayError::LocationNotFound {
            code: "ZZZ".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert_eq!(err.flash().message, DOUBLE_CHECK);
    }

    #[test]
    fn ineligible_move_is_playful() {
        let err = GameplayError::from(NavigationError::InvalidNextLocation);
        assert_eq!(err.class(), ErrorClass::IneligibleMove);
        assert_eq!(err.flash().title, "Nice try!");
    }
}
