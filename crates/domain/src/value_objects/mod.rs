//! Value objects - Immutable objects defined by their attributes

mod codes;
mod names;

pub use codes::{MarkerCode, TeamCode};
pub use names::{InstanceName, LocationName, TeamName};
