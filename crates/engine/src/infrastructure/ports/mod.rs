//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Database access (SQLite today)
//! - Clock/Random (for testing)

mod error;
mod repos;
mod testing;

pub use error::RepoError;
pub use repos::{BlockRepo, BlockStateRepo, CheckInRepo, InstanceRepo, LocationRepo, TeamRepo};
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use repos::{
    MockBlockRepo, MockBlockStateRepo, MockCheckInRepo, MockInstanceRepo, MockLocationRepo,
    MockTeamRepo,
};

#[cfg(test)]
pub use testing::MockClockPort;
