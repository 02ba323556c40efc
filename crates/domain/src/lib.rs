//! ScanQuest domain: entities, ids, value objects, and content blocks.
//!
//! Nothing in this crate performs I/O. Persistence, time, and randomness are
//! supplied by the engine through its ports.

pub mod blocks;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use blocks::{
    Block, BlockBase, BlockError, BlockInput, BlockRecord, BlockRegistry, TeamBlockState,
};
pub use entities::{
    folded_average, CheckIn, CompletionMethod, GameStatus, Instance, InstanceSettings, Location,
    LocationStats, NavigationMethod, NavigationMode, Team, DEFAULT_MAX_NEXT_LOCATIONS,
};
pub use error::DomainError;
pub use ids::{BlockId, InstanceId, LocationId, TeamId};
pub use value_objects::{InstanceName, LocationName, MarkerCode, TeamCode, TeamName};
