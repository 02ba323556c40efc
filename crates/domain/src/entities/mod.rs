//! Domain entities

mod check_in;
mod instance;
mod location;
mod team;

pub use check_in::CheckIn;
pub use instance::{
    CompletionMethod, GameStatus, Instance, InstanceSettings, NavigationMethod, NavigationMode,
    DEFAULT_MAX_NEXT_LOCATIONS,
};
pub use location::{folded_average, Location, LocationStats};
pub use team::Team;
