//! Application state and composition.

use std::sync::Arc;

use scanquest_domain::BlockRegistry;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    ports::{
        BlockRepo, BlockStateRepo, CheckInRepo, ClockPort, InstanceRepo, LocationRepo, RandomPort,
        TeamRepo,
    },
    sqlite::SqliteRepositories,
};
use crate::use_cases;
use crate::use_cases::teams::DEFAULT_CODE_LENGTH;

/// Settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub team_code_length: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            team_code_length: DEFAULT_CODE_LENGTH,
        }
    }
}

/// Main application state.
///
/// Holds the repositories and use cases, passed to HTTP handlers via Axum state.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Container for all repository ports.
pub struct Repositories {
    pub instance: Arc<dyn InstanceRepo>,
    pub location: Arc<dyn LocationRepo>,
    pub team: Arc<dyn TeamRepo>,
    pub check_in: Arc<dyn CheckInRepo>,
    pub block: Arc<dyn BlockRepo>,
    pub block_state: Arc<dyn BlockStateRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub gameplay: use_cases::Gameplay,
    pub blocks: Arc<use_cases::BlockService>,
    pub teams: use_cases::TeamProvisioning,
    pub management: use_cases::ManagementUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(repos: SqliteRepositories, config: AppConfig) -> Self {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());

        let repositories = Repositories {
            instance: repos.instance,
            location: repos.location,
            team: repos.team,
            check_in: repos.check_in,
            block: repos.block,
            block_state: repos.block_state,
        };

        Self::from_repositories(repositories, clock, random, config)
    }

    /// Wire use cases over arbitrary port implementations.
    pub fn from_repositories(
        repositories: Repositories,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        config: AppConfig,
    ) -> Self {
        let registry = Arc::new(BlockRegistry::new());

        let navigation = Arc::new(use_cases::NavigationSelector::new(
            repositories.instance.clone(),
            repositories.location.clone(),
            repositories.check_in.clone(),
        ));
        let ledger = Arc::new(use_cases::CheckInLedger::new(
            repositories.check_in.clone(),
            repositories.location.clone(),
            clock.clone(),
        ));
        let blocks = Arc::new(use_cases::BlockService::new(
            repositories.block.clone(),
            repositories.block_state.clone(),
            registry,
        ));

        let gameplay = use_cases::Gameplay::new(
            repositories.instance.clone(),
            repositories.location.clone(),
            repositories.team.clone(),
            navigation,
            ledger,
            blocks.clone(),
            clock.clone(),
        );

        let teams = use_cases::TeamProvisioning::new(
            repositories.instance.clone(),
            repositories.location.clone(),
            repositories.team.clone(),
            random,
            config.team_code_length,
        );

        let management = use_cases::ManagementUseCases::new(
            use_cases::management::InstanceManagement::new(
                repositories.instance.clone(),
                clock,
            ),
            use_cases::management::LocationManagement::new(
                repositories.instance.clone(),
                repositories.location.clone(),
            ),
        );

        Self {
            repositories,
            use_cases: UseCases {
                gameplay,
                blocks,
                teams,
                management,
            },
        }
    }
}
