//! Use cases - User story orchestration.
//!
//! Each module covers one area of play or administration. Gameplay sits on
//! top and combines navigation, the ledger, and block validation into the
//! player-facing flows.

pub mod blocks;
pub mod gameplay;
pub mod ledger;
pub mod management;
pub mod navigation;
pub mod teams;

pub use blocks::BlockService;
pub use gameplay::Gameplay;
pub use ledger::CheckInLedger;
pub use management::ManagementUseCases;
pub use navigation::NavigationSelector;
pub use teams::TeamProvisioning;
